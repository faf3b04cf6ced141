use std::sync::Arc;

use nearcare_data::{FacilityDataset, VisitorCounter};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info};

use crate::api::{AppState, create_router};
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::geocoder::NominatimGeocoder;
use crate::repository::DatasetRepository;
use crate::search::SearchService;

/// Wire the dataset, repository, geocoder, search service and visitor counter together.
pub fn build_state(config: &ServiceConfig) -> Result<AppState> {
    let dataset = Arc::new(FacilityDataset::open(&config.data_dir)?);
    let repository = Arc::new(DatasetRepository::new(dataset.clone()));
    let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoder)?);
    let search = SearchService::new(geocoder, repository, config.pagination);
    Ok(AppState {
        search: Arc::new(search),
        dataset,
        visitors: Arc::new(VisitorCounter::open(&config.data_dir)?),
    })
}

/// Serve the API until Ctrl+C or SIGTERM.
pub async fn serve(config: ServiceConfig) -> Result<()> {
    let state = build_state(&config)?;
    // Load the collection before the first request pays for it.
    let facilities = state.dataset.len()?;

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(
        address = %listener.local_addr()?,
        facilities,
        geocoder = %config.geocoder.base_url,
        "NearCare listening"
    );

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
