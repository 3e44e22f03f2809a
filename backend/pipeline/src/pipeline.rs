//! The inspection pipeline: OCR, concurrent field layers, consolidation.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};
use uuid::Uuid;

use tagscan_config::TagScanConfig;
use tagscan_core::{ConsolidatedRecord, DueStatus, TagScanError};
use tagscan_logging::{LayerEvent, LayerEventLogger};
use tagscan_media::{load_image, ImageReference, MediaError};
use tagscan_vision::{build_provider, DegradeReason, InvokerSettings, LayerOutcome, VisionInvoker};

use crate::consolidate::{consolidate, LayerAnswers};
use crate::layers::FieldKind;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("analysis cancelled")]
    Cancelled,

    #[error(transparent)]
    Image(#[from] MediaError),

    #[error(transparent)]
    Setup(#[from] TagScanError),
}

impl From<PipelineError> for TagScanError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Cancelled => TagScanError::Cancelled,
            PipelineError::Image(e) => TagScanError::ImageRejected(e.to_string()),
            PipelineError::Setup(e) => e,
        }
    }
}

/// One finished analysis: the record plus how each layer got its answer.
#[derive(Debug, Clone, Serialize)]
pub struct InspectionAnalysis {
    pub inspection_id: Uuid,
    pub record: ConsolidatedRecord,
    #[serde(skip)]
    pub outcomes: BTreeMap<FieldKind, LayerOutcome>,
}

impl InspectionAnalysis {
    /// Layers that fell back to the sentinel.
    pub fn degraded_layers(&self) -> Vec<FieldKind> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_degraded())
            .map(|(kind, _)| *kind)
            .collect()
    }

    pub fn due_status(&self, today: NaiveDate, window_days: i64) -> DueStatus {
        self.record.due_status(today, window_days)
    }
}

pub struct InspectionPipeline {
    invoker: Arc<VisionInvoker>,
    events: LayerEventLogger,
}

impl InspectionPipeline {
    pub fn new(invoker: Arc<VisionInvoker>) -> Self {
        Self {
            invoker,
            events: LayerEventLogger::default(),
        }
    }

    pub fn with_event_logger(mut self, events: LayerEventLogger) -> Self {
        self.events = events;
        self
    }

    /// Build the provider and invoker the config selects.
    pub fn from_config(config: &TagScanConfig) -> Result<Self, TagScanError> {
        let vision = config.vision();
        let provider = build_provider(&vision)?;
        let invoker = VisionInvoker::new(provider, InvokerSettings::from_config(&vision));
        let redact = config.logging().redact_sensitive.unwrap_or(true);
        Ok(Self::new(Arc::new(invoker)).with_event_logger(LayerEventLogger::new(redact)))
    }

    /// Load an image file, enforcing `max_bytes`, and analyze it.
    pub async fn analyze_path(&self, path: &Path, max_bytes: u64) -> Result<InspectionAnalysis, PipelineError> {
        let image = load_image(path, max_bytes).await?;
        Ok(self.analyze(image).await)
    }

    /// Run every layer and consolidate. Never fails; unanswered layers
    /// become `unknown`.
    ///
    /// Dropping the returned future aborts any layer still in flight.
    pub async fn analyze(&self, image: ImageReference) -> InspectionAnalysis {
        let inspection_id = Uuid::new_v4();
        let image = Arc::new(image);
        info!(
            inspection_id = %inspection_id,
            format = %image.format(),
            provider = %self.invoker.provider_name(),
            "Starting tag analysis"
        );

        let ocr = self.ocr(inspection_id, &image).await;
        let raw_text = ocr.answer().to_string();

        let mut outcomes = BTreeMap::new();
        outcomes.insert(FieldKind::RawText, ocr);
        outcomes.extend(self.fan_out(inspection_id, &image, &raw_text).await);

        let mut answers = LayerAnswers::default();
        for (kind, outcome) in &outcomes {
            self.log_outcome(inspection_id, *kind, outcome);
            answers.set(*kind, outcome.answer());
        }

        let record = consolidate(&answers);
        info!(
            inspection_id = %inspection_id,
            confidence = record.confidence_score,
            requires_attention = record.requires_attention,
            "Tag analysis complete"
        );

        InspectionAnalysis {
            inspection_id,
            record,
            outcomes,
        }
    }

    /// Like [`analyze`](Self::analyze), but gives up as soon as `cancel`
    /// completes.
    pub async fn analyze_until<F>(&self, image: ImageReference, cancel: F) -> Result<InspectionAnalysis, PipelineError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                info!("Tag analysis cancelled");
                Err(PipelineError::Cancelled)
            }
            analysis = self.analyze(image) => Ok(analysis),
        }
    }

    /// Transcribe the tag on its own task so a panicking provider degrades
    /// only the OCR layer.
    async fn ocr(&self, inspection_id: Uuid, image: &Arc<ImageReference>) -> LayerOutcome {
        let invoker = Arc::clone(&self.invoker);
        let image = Arc::clone(image);
        let prompt = FieldKind::RawText.query().render("");

        let mut task = JoinSet::new();
        task.spawn(async move { invoker.invoke(FieldKind::RawText.name(), &prompt, &image).await });

        match task.join_next().await {
            Some(Ok(outcome)) => outcome,
            Some(Err(e)) => {
                error!(inspection_id = %inspection_id, error = %e, "OCR task panicked");
                LayerOutcome::Degraded(DegradeReason::TaskFailed(e.to_string()))
            }
            None => LayerOutcome::Degraded(DegradeReason::TaskFailed("OCR task did not complete".into())),
        }
    }

    /// Run the eight field layers concurrently. Each task owns its prompt
    /// and shares the invoker and image; a failed task degrades only its
    /// own field.
    async fn fan_out(
        &self,
        inspection_id: Uuid,
        image: &Arc<ImageReference>,
        raw_text: &str,
    ) -> BTreeMap<FieldKind, LayerOutcome> {
        let mut outcomes: BTreeMap<FieldKind, LayerOutcome> = FieldKind::FAN_OUT
            .into_iter()
            .map(|kind| {
                let pending = DegradeReason::TaskFailed("layer task did not complete".into());
                (kind, LayerOutcome::Degraded(pending))
            })
            .collect();

        let mut join_set = JoinSet::new();
        for kind in FieldKind::FAN_OUT {
            let invoker = Arc::clone(&self.invoker);
            let image = Arc::clone(image);
            let prompt = kind.query().render(raw_text);
            join_set.spawn(async move {
                let outcome = invoker.invoke(kind.name(), &prompt, &image).await;
                (kind, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((kind, outcome)) => {
                    outcomes.insert(kind, outcome);
                }
                Err(e) => {
                    error!(inspection_id = %inspection_id, error = %e, "Layer task panicked");
                }
            }
        }
        outcomes
    }

    fn log_outcome(&self, inspection_id: Uuid, kind: FieldKind, outcome: &LayerOutcome) {
        let layer = kind.name().to_string();
        let event = match outcome {
            LayerOutcome::Degraded(reason) => LayerEvent::Degraded {
                layer,
                reason: reason.to_string(),
            },
            other => LayerEvent::Answered {
                layer,
                source: other.source().to_string(),
                answer: other.answer().to_string(),
            },
        };
        self.events.log_event(&inspection_id.to_string(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tagscan_core::{VisionProvider, VisionRequest, VisionResponse, UNKNOWN};
    use tagscan_vision::{MockProvider, MockReply};

    const OCR: &str = "ABC dry chemical, inspected 6/15/2023";

    fn image() -> ImageReference {
        ImageReference::from_bytes(b"\xff\xd8\xff\xe0tag")
    }

    fn pipeline_with(provider: Arc<dyn VisionProvider>, timeout: Duration) -> InspectionPipeline {
        let settings = InvokerSettings {
            timeout,
            ..InvokerSettings::default()
        };
        InspectionPipeline::new(Arc::new(VisionInvoker::new(provider, settings)))
    }

    fn scenario_provider() -> MockProvider {
        MockProvider::new(MockReply::direct(UNKNOWN))
            .on("ALL visible text", MockReply::direct(OCR))
            .on("inspection YEAR", MockReply::direct("2023"))
            .on("inspection MONTH", MockReply::direct("6"))
            .on("inspection DAY", MockReply::direct("15"))
            .on("extinguisher TYPE", MockReply::reasoning("Label reads dry chem.\nType: ABC"))
            .on("overall CONDITION", MockReply::direct("Good"))
            .on(
                "servicing company",
                MockReply::direct("```json\n{\"name\": \"Acme\", \"phone\": \"555-0100\"}\n```"),
            )
            .on("AE, HE, EE and FE", MockReply::Fail("rate limited".into()))
    }

    #[tokio::test]
    async fn scenario_produces_full_record() {
        let provider = Arc::new(scenario_provider());
        let pipeline = pipeline_with(provider.clone(), Duration::from_secs(5));

        let analysis = pipeline.analyze(image()).await;
        let record = &analysis.record;

        assert_eq!(provider.call_count(), 9);
        assert_eq!(record.raw_text_analysis, OCR);
        assert_eq!(record.extinguisher_type, "ABC");
        assert_eq!(record.condition, "Good");
        assert_eq!(record.confidence_score, 1.0);
        assert!(!record.requires_attention);
        let due = record.next_due_date.as_ref().unwrap();
        assert_eq!((due.year, due.month, due.day), (Some(2024), Some(6), Some(15)));
        assert_eq!(record.service_company.name, "Acme");
        assert_eq!(record.service_company.website, UNKNOWN);
        assert_eq!(record.equipment_numbers.ae_number, UNKNOWN);
        assert_eq!(analysis.degraded_layers(), vec![FieldKind::EquipmentNumbers]);
        assert!(matches!(
            analysis.outcomes[&FieldKind::ExtinguisherType],
            LayerOutcome::FromReasoning(_)
        ));
    }

    #[tokio::test]
    async fn ocr_runs_first_and_feeds_every_layer() {
        let provider = Arc::new(scenario_provider());
        let pipeline = pipeline_with(provider.clone(), Duration::from_secs(5));
        pipeline.analyze(image()).await;

        let prompts = provider.prompts();
        assert!(prompts[0].contains("ALL visible text"));
        assert_eq!(prompts.len(), 9);
        assert!(prompts[1..].iter().all(|p| p.contains(OCR)));
    }

    #[tokio::test]
    async fn unreachable_model_yields_all_unknown_record() {
        let provider = Arc::new(MockProvider::new(MockReply::Fail("connection refused".into())));
        let pipeline = pipeline_with(provider, Duration::from_secs(5));

        let analysis = pipeline.analyze(image()).await;
        let record = &analysis.record;

        assert_eq!(analysis.degraded_layers().len(), 9);
        assert_eq!(record.raw_text_analysis, UNKNOWN);
        assert_eq!(record.extinguisher_type, UNKNOWN);
        assert_eq!(record.confidence_score, 0.0);
        assert!(record.next_due_date.is_none());
        assert!(!record.requires_attention);
    }

    #[tokio::test]
    async fn slow_layer_times_out_alone() {
        let provider = Arc::new(
            MockProvider::new(MockReply::direct("Fair"))
                .on("ALL visible text", MockReply::direct("service due"))
                .on("inspection DAY", MockReply::Hang),
        );
        let pipeline = pipeline_with(provider, Duration::from_millis(100));

        let analysis = pipeline.analyze(image()).await;
        assert_eq!(analysis.degraded_layers(), vec![FieldKind::Day]);
        assert_eq!(analysis.record.condition, "Fair");
        assert!(analysis.record.requires_attention);
    }

    struct PanicsOnCondition;

    #[async_trait]
    impl VisionProvider for PanicsOnCondition {
        fn name(&self) -> &str {
            "panics"
        }

        async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
            if request.user_prompt.contains("overall CONDITION") {
                panic!("provider bug");
            }
            Ok(VisionResponse {
                content: "2023".into(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn panicked_layer_degrades_only_its_field() {
        let pipeline = pipeline_with(Arc::new(PanicsOnCondition), Duration::from_secs(5));
        let analysis = pipeline.analyze(image()).await;

        assert_eq!(analysis.degraded_layers(), vec![FieldKind::Condition]);
        assert!(matches!(
            &analysis.outcomes[&FieldKind::Condition],
            LayerOutcome::Degraded(DegradeReason::TaskFailed(_))
        ));
        assert_eq!(analysis.record.condition, UNKNOWN);
        assert_eq!(analysis.record.last_inspection_date.year, Some(2023));
    }

    struct PanicsOnOcr;

    #[async_trait]
    impl VisionProvider for PanicsOnOcr {
        fn name(&self) -> &str {
            "panics"
        }

        async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
            if request.user_prompt.contains("ALL visible text") {
                panic!("ocr provider bug");
            }
            Ok(VisionResponse {
                content: "Good".into(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn panicked_ocr_degrades_only_raw_text() {
        let pipeline = pipeline_with(Arc::new(PanicsOnOcr), Duration::from_secs(5));
        let analysis = pipeline.analyze(image()).await;

        assert_eq!(analysis.degraded_layers(), vec![FieldKind::RawText]);
        assert!(matches!(
            &analysis.outcomes[&FieldKind::RawText],
            LayerOutcome::Degraded(DegradeReason::TaskFailed(_))
        ));
        assert_eq!(analysis.record.raw_text_analysis, UNKNOWN);
        assert_eq!(analysis.record.condition, "Good");
    }

    /// Counts fan-out calls currently in flight.
    struct LiveGuard(Arc<AtomicUsize>);

    impl LiveGuard {
        fn enter(live: &Arc<AtomicUsize>) -> Self {
            live.fetch_add(1, Ordering::SeqCst);
            Self(Arc::clone(live))
        }
    }

    impl Drop for LiveGuard {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Answers OCR, then hangs every field layer while holding a guard.
    struct HangsAfterOcr {
        live: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl VisionProvider for HangsAfterOcr {
        fn name(&self) -> &str {
            "hangs"
        }

        async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse> {
            if request.user_prompt.contains("ALL visible text") {
                return Ok(VisionResponse {
                    content: OCR.into(),
                    ..Default::default()
                });
            }
            let _guard = LiveGuard::enter(&self.live);
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn cancel_aborts_in_flight_field_layers() {
        let live = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(HangsAfterOcr { live: Arc::clone(&live) });
        let pipeline = pipeline_with(provider, Duration::from_secs(60));

        let started = Arc::clone(&live);
        let cancel = async move {
            while started.load(Ordering::SeqCst) < FieldKind::FAN_OUT.len() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };

        let result = pipeline.analyze_until(image(), cancel).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));

        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while live.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(drained.is_ok(), "{} field layers still running", live.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancellation_returns_cancelled() {
        let provider = Arc::new(MockProvider::new(MockReply::Hang));
        let pipeline = pipeline_with(provider, Duration::from_secs(60));

        let result = pipeline
            .analyze_until(image(), tokio::time::sleep(Duration::from_millis(50)))
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn completed_analysis_wins_over_pending_cancel() {
        let provider = Arc::new(MockProvider::new(MockReply::direct("unknown")));
        let pipeline = pipeline_with(provider, Duration::from_secs(5));

        let result = pipeline
            .analyze_until(image(), std::future::pending::<()>())
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_any_call() {
        let path = std::env::temp_dir().join(format!("tagscan-big-{}.jpg", std::process::id()));
        tokio::fs::write(&path, vec![0xffu8; 64]).await.unwrap();

        let provider = Arc::new(MockProvider::new(MockReply::direct("2023")));
        let pipeline = pipeline_with(provider.clone(), Duration::from_secs(5));
        let result = pipeline.analyze_path(&path, 16).await;

        assert!(matches!(result, Err(PipelineError::Image(MediaError::TooLarge { .. }))));
        assert_eq!(provider.call_count(), 0);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
