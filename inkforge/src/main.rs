use std::{env, fs, io::Read, sync::Arc};

use anyhow::{Context, bail};
use log::info;
use tokio::{signal, task};
use tokio_util::sync::CancellationToken;

use inkforge::{Engine, EngineConfig, GenerationRequest};

const USAGE: &str = "usage: inkforge [request.json | --styles]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let arg = env::args().nth(1);
    if arg.as_deref().is_some_and(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let config = EngineConfig::from_env().context("loading configuration")?;
    let engine = Arc::new(Engine::from_config(config).context("starting the engine")?);

    if arg.as_deref() == Some("--styles") {
        let catalog = engine.styles().catalog()?;
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let raw = match arg {
        Some(path) if path.starts_with('-') => bail!("unknown flag {path}\n{USAGE}"),
        Some(path) => fs::read_to_string(&path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    let request: GenerationRequest = serde_json::from_str(&raw).context("parsing the request")?;

    let cancel = CancellationToken::new();
    let mut generation = task::spawn_blocking({
        let engine = engine.clone();
        let cancel = cancel.clone();
        move || engine.generate_with(&request, &cancel)
    });

    let result = tokio::select! {
        ret = &mut generation => ret?,
        _ = signal::ctrl_c() => {
            info!("received SIGINT, cancelling");
            cancel.cancel();
            generation.await?
        }
    }?;

    info!(
        steps = result.steps_used,
        strokes = result.strokes.len(),
        seed = result.seed;
        "done"
    );
    println!("{}", serde_json::to_string(&result.response())?);

    Ok(())
}
