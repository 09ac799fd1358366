// Application layer - Use case interactors

pub mod container;
pub mod export_interactor;
pub mod pull_interactor;
pub mod report_interactor;
pub mod sync_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer, Ports};
pub use export_interactor::ExportInteractor;
pub use pull_interactor::PullInteractor;
pub use report_interactor::ReportInteractor;
pub use sync_interactor::SyncInteractor;
