pub mod console;
pub mod contact;
pub mod diagnostics;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod filters;
pub mod flatten;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod types;
pub mod view;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use directory::DirectoryService;
use session::OrgChartSession;
use snapshot::SnapshotDirectory;

pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = try_run() {
        log::error!("OrgChart: {}", e);
        eprintln!("orgchart: {}", e);
        std::process::exit(1);
    }
}

fn try_run() -> Result<(), String> {
    let config_path = state::config_path()?;
    let config = state::load_config_or_default(&config_path)?;

    // A path on the command line wins over the configured snapshot.
    let snapshot_path = std::env::args()
        .nth(1)
        .or_else(|| config.snapshot_path.clone())
        .map(PathBuf::from)
        .ok_or_else(|| {
            format!(
                "No directory snapshot. Pass a path or set \"snapshotPath\" in {}",
                config_path.display()
            )
        })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;

    runtime.block_on(async {
        let mut directory = SnapshotDirectory::load(&snapshot_path).map_err(|e| {
            format!("Failed to load snapshot {}: {}", snapshot_path.display(), e)
        })?;
        log::info!(
            "OrgChart: loaded {} people from {}",
            directory.len(),
            snapshot_path.display()
        );

        if let Some(email) = config.current_user_email.as_deref() {
            match directory.get_user_by_email(email).await {
                Ok(Some(id)) => directory = directory.with_current_user(Some(id)),
                Ok(None) => log::warn!("OrgChart: current user {} not in snapshot", email),
                Err(e) => log::warn!("OrgChart: current user lookup failed: {}", e),
            }
        }

        let session = OrgChartSession::new(Arc::new(directory), config);
        session.init().await;

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        console::run_console(&session, &config_path, stdin.lock(), &mut stdout)
            .await
            .map_err(|e| format!("Console error: {}", e))
    })
}
