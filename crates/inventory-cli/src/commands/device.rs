//! Device commands

use clap::{Args, Subcommand};
use inventory_core::Device;
use inventory_engine::{apply_engine_query, EngineQuery, EngineQueryResult};
use inventory_store::SqliteStore;

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// List devices with their resolved parent
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print the full device documents as a JSON array
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: DeviceArgs, store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        DeviceCommand::List(list_args) => execute_list(list_args, store),
    }
}

fn execute_list(args: ListArgs, store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    let EngineQueryResult::Devices(devices) = apply_engine_query(EngineQuery::ListDevices, store)?
    else {
        return Err("unexpected engine result".into());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    for device in &devices {
        println!("{}", list_line(device));
    }
    Ok(())
}

fn list_line(device: &Device) -> String {
    let kind = if device.spec.device_type.is_empty() {
        "-"
    } else {
        device.spec.device_type.as_str()
    };
    format!(
        "{}  {}  {}  parent={}",
        device.uid(),
        device.serial_number(),
        kind,
        device.spec.resolved_parent().unwrap_or("-")
    )
}
