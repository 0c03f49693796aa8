use std::process::ExitCode;
use std::sync::Arc;

use goteam_client::config;
use goteam_core::session::SessionStore;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = config::default_config_path();
    let mut cfg = config::load_config(&config_path);
    cfg.apply_env();

    let session = Arc::new(match config::session_from_env() {
        Some(session) => SessionStore::with_session(session),
        None => SessionStore::new(),
    });

    let context = match goteam_client::connect(&cfg, session) {
        Ok(context) => context,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match context.verify_session().await {
        Ok(true) => {}
        Ok(false) => {
            log::error!(
                "No valid session; set {} and {}",
                config::ENV_USERNAME,
                config::ENV_TOKEN
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            log::error!("Token verification failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let Some(board_id) = cfg.board_id else {
        log::error!("No board_id in {}", config_path.display());
        return ExitCode::FAILURE;
    };
    if let Err(e) = context.load_board(Some(board_id)).await {
        log::error!("Failed to load board {}: {}", board_id, e);
        return ExitCode::FAILURE;
    }

    let snapshot = context.snapshot();
    println!("{} (#{})", snapshot.board.name, board_id);
    for column in snapshot.board.columns() {
        println!("{} [{}]", column.order, column.tasks.len());
        for task in &column.tasks {
            println!("  {:>3}. {} (#{})", task.position, task.title, task.id);
        }
    }
    let members: Vec<&str> = snapshot.members.iter().map(|m| m.username.as_str()).collect();
    println!("members: {}", members.join(", "));
    ExitCode::SUCCESS
}
