//! A toy training loop driven by a context tree.
//!
//! The loop only writes state; logging and bookkeeping hang off callbacks.
//!
//! Run with: `RUST_LOG=debug cargo run -p dictmsgr-core --example training_loop`

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dictmsgr_core::Context;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let ctx = Context::from_json(
        json!({
            "global_iters": 0,
            "optimizer": {"lr": 0.1},
            "batch": {}
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
    )?;

    ctx.subscribe("global_iters", |root, value| {
        if let Some(iter) = value.as_leaf().and_then(Value::as_i64) {
            if iter % 2 == 0 {
                let lr = root
                    .get_leaf("optimizer/lr")
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                // decay lives in a callback so the loop never touches it
                if let Err(e) = root.write("optimizer/lr", json!(lr * 0.5)) {
                    tracing::warn!("Failed to decay lr: {}", e);
                }
            }
        }
    })?;

    ctx.subscribe("batch/loss", |root, value| {
        let iter = root.get_leaf("global_iters").unwrap_or(Value::Null);
        info!("iter {} loss {}", iter, value.as_leaf().unwrap_or(&serde_json::Value::Null));
    })?;

    for step in 0..6 {
        ctx.load_json(
            json!({"batch": {"img": format!("img_{step}"), "loss": 1.0 / (step as f64 + 1.0)}})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        )?;
        ctx.modify("global_iters", |v| json!(v.as_i64().unwrap_or(0) + 1))?;
    }

    info!("final state: {}", ctx.to_json()?);
    Ok(())
}
