use std::collections::HashMap;
use std::sync::Arc;

use super::{classify_sink, ConsoleSink, ItemSink, LocalFileSink, SinkKind, TopicNames};
use crate::error::{SinkError, SinkResult};

/// Everything a factory needs to build a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    pub kind: SinkKind,
    pub output: Option<String>,
    /// Topic per item type, for the kinds that publish to topics.
    pub topics: TopicNames,
}

/// Builds a sink for a descriptor.
pub type SinkFactory = Arc<dyn Fn(&SinkDescriptor) -> SinkResult<Arc<dyn ItemSink>> + Send + Sync>;

/// Maps output descriptors to sinks.
pub struct SinkRouter {
    factories: HashMap<SinkKind, SinkFactory>,
    topics: TopicNames,
}

impl SinkRouter {
    /// Router with the console and local file sinks registered.
    pub fn new(topics: TopicNames) -> Self {
        let mut router = Self {
            factories: HashMap::new(),
            topics,
        };
        router.register(
            SinkKind::Console,
            Arc::new(|_: &SinkDescriptor| Ok(Arc::new(ConsoleSink::new()) as Arc<dyn ItemSink>)),
        );
        router.register(
            SinkKind::LocalFile,
            Arc::new(|descriptor: &SinkDescriptor| {
                let output = descriptor.output.as_deref().unwrap_or_default();
                Ok(Arc::new(LocalFileSink::from_output(output)) as Arc<dyn ItemSink>)
            }),
        );
        router
    }

    /// Register or replace the factory for `kind`.
    pub fn register(&mut self, kind: SinkKind, factory: SinkFactory) {
        self.factories.insert(kind, factory);
    }

    /// Classify `output` and describe the sink it calls for.
    pub fn describe(&self, output: Option<&str>) -> SinkDescriptor {
        let kind = classify_sink(output);
        let topics = match (kind, output) {
            (SinkKind::PubSub, Some(output)) => TopicNames::for_pubsub(output.trim()),
            _ => self.topics.clone(),
        };
        SinkDescriptor {
            kind,
            output: output.map(|o| o.trim().to_string()),
            topics,
        }
    }

    /// Build the sink for `output`.
    pub fn build(&self, output: Option<&str>) -> SinkResult<Arc<dyn ItemSink>> {
        let descriptor = self.describe(output);
        let factory = self
            .factories
            .get(&descriptor.kind)
            .ok_or(SinkError::Unsupported(descriptor.kind))?;
        tracing::info!(kind = %descriptor.kind, "creating sink");
        factory(&descriptor)
    }
}

impl Default for SinkRouter {
    fn default() -> Self {
        Self::new(TopicNames::default())
    }
}
