//! Control commands: arm, disarm, status, latest.

use crossclip_agent::{AgentConfig, HttpTransport, RelayTransport};
use crossclip_protocol::{ClipItem, ClipKind};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn transport(server: &str, secret: &str) -> Result<HttpTransport, Box<dyn std::error::Error>> {
    Ok(HttpTransport::new(&AgentConfig::new(server, secret))?)
}

/// Arms the relay.
pub async fn arm(server: &str, secret: &str) -> CommandResult {
    let response = transport(server, secret)?.arm().await?;
    println!("{}", response.message);
    Ok(())
}

/// Disarms the relay.
pub async fn disarm(server: &str, secret: &str) -> CommandResult {
    let response = transport(server, secret)?.disarm().await?;
    println!("{}", response.message);
    Ok(())
}

/// Prints the relay state.
pub async fn status(server: &str, secret: &str, format: &str) -> CommandResult {
    let status = transport(server, secret)?.status().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        _ => {
            println!("Relay Status");
            println!("============");
            println!("State:     {}", if status.armed { "ARMED" } else { "DISARMED" });
            println!("Clips:     {}", status.item_count);
            println!("Clients:   {}", status.connected_clients);
        }
    }
    Ok(())
}

/// Prints the most recent clip.
pub async fn latest(server: &str, secret: &str, format: &str) -> CommandResult {
    let item = transport(server, secret)?.latest().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&item)?),
        _ => print_clip(&item),
    }
    Ok(())
}

fn print_clip(item: &ClipItem) {
    println!("Id:        {}", item.id);
    println!("Created:   {}", item.created_at);
    match item.kind {
        ClipKind::Text => {
            println!("Type:      text");
            println!();
            println!("{}", item.content);
        }
        ClipKind::Image => {
            println!("Type:      image");
            println!("Blob:      {}", item.blob_name().unwrap_or("-"));
        }
    }
}
