use std::sync::Arc;

use crate::adapters::{
    CsvTableAdapter, FixedRateProbe, HttpLabelApiAdapter, HttpObjectStoreAdapter,
    ProbeLibavAdapter, ProcessReportGenerator, TracingLogAdapter,
};
use crate::app::{
    export_interactor::ExportInteractor, pull_interactor::PullInteractor,
    report_interactor::ReportInteractor, sync_interactor::SyncInteractor,
};
use crate::config_initialization::AppSettings;
use crate::domain::errors::DomainError;
use crate::domain::model::FrameRate;
use crate::ports::{
    LabelApiPort, LogPort, ObjectStorePort, ReportGeneratorPort, TableFilePort, VideoProbePort,
};

pub trait AppContainer: Send + Sync {
    fn export_interactor(&self) -> Arc<ExportInteractor>;
    fn sync_interactor(&self) -> Arc<SyncInteractor>;
    fn pull_interactor(&self) -> Arc<PullInteractor>;
    fn report_interactor(&self) -> Result<Arc<ReportInteractor>, DomainError>;
    fn probe_port(&self) -> Arc<dyn VideoProbePort>;
}

/// Ports the interactors are wired from
#[derive(Clone)]
pub struct Ports {
    pub api: Arc<dyn LabelApiPort>,
    pub store: Arc<dyn ObjectStorePort>,
    pub table: Arc<dyn TableFilePort>,
    pub probe: Arc<dyn VideoProbePort>,
    pub report: Option<Arc<dyn ReportGeneratorPort>>,
    pub log: Arc<dyn LogPort>,
}

pub struct DefaultAppContainer {
    export_interactor: Arc<ExportInteractor>,
    sync_interactor: Arc<SyncInteractor>,
    pull_interactor: Arc<PullInteractor>,
    report_interactor: Option<Arc<ReportInteractor>>,
    probe_port: Arc<dyn VideoProbePort>,
}

impl DefaultAppContainer {
    /// Wire the production adapters. A fixed rate replaces probing the video.
    pub fn new(settings: &AppSettings, fixed_rate: Option<FrameRate>) -> Result<Self, DomainError> {
        let probe: Arc<dyn VideoProbePort> = match fixed_rate {
            Some(rate) => Arc::new(FixedRateProbe::new(rate)),
            None => Arc::new(ProbeLibavAdapter::new()?),
        };
        let report: Option<Arc<dyn ReportGeneratorPort>> = if settings.report_command.trim().is_empty() {
            None
        } else {
            Some(Arc::new(ProcessReportGenerator::new(&settings.report_command)?))
        };

        let ports = Ports {
            api: Arc::new(HttpLabelApiAdapter::new(settings.api_settings())?),
            store: Arc::new(HttpObjectStoreAdapter::new(settings.storage_settings())?),
            table: Arc::new(CsvTableAdapter::new()),
            probe,
            report,
            log: Arc::new(TracingLogAdapter::new(settings.log_level.clone())),
        };
        Ok(Self::with_ports(ports, settings))
    }

    /// Wire interactors from already-built ports
    pub fn with_ports(ports: Ports, settings: &AppSettings) -> Self {
        let export_interactor = Arc::new(ExportInteractor::new(
            Arc::clone(&ports.table),
            Arc::clone(&ports.log),
        ));

        let sync_interactor = Arc::new(SyncInteractor::new(
            Arc::clone(&ports.api),
            Arc::clone(&ports.log),
        ));

        let pull_interactor = Arc::new(PullInteractor::new(
            Arc::clone(&ports.api),
            Arc::clone(&ports.store),
            Arc::clone(&ports.probe),
            Arc::clone(&ports.log),
        ));

        let report_interactor = ports.report.as_ref().map(|report| {
            Arc::new(ReportInteractor::new(
                Arc::clone(&sync_interactor),
                Arc::clone(&export_interactor),
                Arc::clone(&ports.store),
                Arc::clone(report),
                Arc::clone(&ports.log),
                settings.work_dir.clone(),
            ))
        });

        Self {
            export_interactor,
            sync_interactor,
            pull_interactor,
            report_interactor,
            probe_port: ports.probe,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn export_interactor(&self) -> Arc<ExportInteractor> {
        Arc::clone(&self.export_interactor)
    }

    fn sync_interactor(&self) -> Arc<SyncInteractor> {
        Arc::clone(&self.sync_interactor)
    }

    fn pull_interactor(&self) -> Arc<PullInteractor> {
        Arc::clone(&self.pull_interactor)
    }

    fn report_interactor(&self) -> Result<Arc<ReportInteractor>, DomainError> {
        self.report_interactor
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| DomainError::Config("report_command is not configured".to_string()))
    }

    fn probe_port(&self) -> Arc<dyn VideoProbePort> {
        Arc::clone(&self.probe_port)
    }
}
