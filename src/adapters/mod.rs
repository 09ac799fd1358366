// Adapters - External system implementations

pub mod csv_table;
pub mod http_api;
pub mod memory;
pub mod object_store;
pub mod probe_libav;
pub mod report_process;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use csv_table::CsvTableAdapter;
pub use http_api::{ApiSettings, HttpLabelApiAdapter};
pub use memory::{InMemoryLabelApi, InMemoryObjectStore};
pub use object_store::{HttpObjectStoreAdapter, StorageSettings};
pub use probe_libav::{FixedRateProbe, ProbeLibavAdapter};
pub use report_process::ProcessReportGenerator;
pub use toml_config::TomlConfigAdapter;
pub use tracing_log::TracingLogAdapter;
