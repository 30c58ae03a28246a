//! Pipeline Runner: chains stages and records a trace per stage
use crate::context::ExecutionContext;
use crate::data_model::{ProcessedRow, StageTrace};
use crate::events::EngineEvent;
use crate::stage::Stage;
use serde::Serialize;
use std::time::Instant;

pub struct PipelineRunner {
    stages: Vec<Box<dyn Stage>>,
    pipeline_id: String,
}

impl PipelineRunner {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        let pipeline_id = stages
            .iter()
            .map(|s| s.id().split('.').next().unwrap_or("?"))
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            pipeline_id,
        }
    }

    pub fn run(
        &self,
        rows: Vec<ProcessedRow>,
        ctx: &ExecutionContext,
    ) -> (Vec<ProcessedRow>, Vec<StageTrace>) {
        let mut current = rows;
        let mut traces = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let start = Instant::now();
            let rows_in = current.len();
            let in_hash = digest(&current);

            current = stage.run(current, ctx);

            let rows_out = current.len();
            ctx.emit(EngineEvent::StageCompleted {
                stage: stage.id().to_string(),
                rows_in,
                rows_out,
            });

            traces.push(StageTrace {
                id: stage.id().to_string(),
                rows_in,
                rows_out,
                in_hash,
                out_hash: digest(&current),
                deterministic: stage.deterministic(),
                latency_ms: start.elapsed().as_millis() as u64,
            });
        }

        (current, traces)
    }

    pub fn pipeline_id(&self) -> &str {
        &self.pipeline_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// blake3 digest of a value's JSON form
pub fn digest<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_vec(value) {
        Ok(bytes) => format!("blake3:{}", blake3::hash(&bytes)),
        Err(_) => "blake3:unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_model::DataRow;
    use crate::events::RecordingSink;
    use std::sync::Arc;

    struct DropEmpty;

    impl Stage for DropEmpty {
        fn id(&self) -> &'static str {
            "drop.empty.v1"
        }

        fn run(&self, rows: Vec<ProcessedRow>, _ctx: &ExecutionContext) -> Vec<ProcessedRow> {
            rows.into_iter().filter(|r| r.value.is_some()).collect()
        }
    }

    struct Identity;

    impl Stage for Identity {
        fn id(&self) -> &'static str {
            "identity.v1"
        }

        fn run(&self, rows: Vec<ProcessedRow>, _ctx: &ExecutionContext) -> Vec<ProcessedRow> {
            rows
        }
    }

    fn row(value: Option<f64>) -> ProcessedRow {
        ProcessedRow {
            dimensions: DataRow::new(),
            level1: "G".into(),
            level2: String::new(),
            level3: String::new(),
            level4: String::new(),
            metric: "m".into(),
            metric_key: "m".into(),
            value,
        }
    }

    #[test]
    fn test_pipeline_id_and_traces() {
        let sink = Arc::new(RecordingSink::new());
        let ctx = ExecutionContext::with_sink(sink.clone());
        let runner = PipelineRunner::new(vec![Box::new(DropEmpty), Box::new(Identity)]);
        assert_eq!(runner.pipeline_id(), "drop→identity");

        let (rows, traces) = runner.run(vec![row(Some(1.0)), row(None)], &ctx);
        assert_eq!(rows.len(), 1);
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0].rows_in, 2);
        assert_eq!(traces[0].rows_out, 1);
        assert_ne!(traces[0].in_hash, traces[0].out_hash);
        assert_eq!(traces[1].in_hash, traces[1].out_hash);
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_digest_is_stable() {
        let rows = vec![row(Some(2.5))];
        assert_eq!(digest(&rows), digest(&rows.clone()));
        assert!(digest(&rows).starts_with("blake3:"));
    }
}
