//! `hypermap events`: print the event table.

use anyhow::Result;
use hypermap_evm::{EventSchema, EventTable};
use std::path::Path;

use crate::cmd_build::load_table;

pub fn run(abi: Option<&Path>, json: bool) -> Result<()> {
    let table = match abi {
        Some(path) => load_table(path)?,
        None => EventTable::hypermap(),
    };
    let mut schemas: Vec<&EventSchema> = table.iter().collect();
    schemas.sort_by_key(|s| s.kind.as_str());

    if json {
        let rows: Vec<_> = schemas
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.kind.as_str(),
                    "signature": s.signature(),
                    "fingerprint": s.fingerprint,
                    "fields": s.fields.iter().map(|f| serde_json::json!({
                        "name": f.name,
                        "type": f.ty.abi_name(),
                        "indexed": f.indexed,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    for s in schemas {
        println!("{:<10} {}", s.kind.as_str(), s.fingerprint);
        println!("           {}", s.signature());
    }
    Ok(())
}
