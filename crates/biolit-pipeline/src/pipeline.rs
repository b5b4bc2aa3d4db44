use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use biolit_core::article::{ArticleRecord, ArticleSummary};
use biolit_core::config::{BiolitConfig, CooccurrenceWindow};
use biolit_core::entity::{EntityId, EntityType, PairKey};
use biolit_core::ingest::{IngestResult, IngestWarning};
use biolit_core::tagging::{EntityTagger, RawMention};
use biolit_extraction::{CooccurrenceBuilder, Normalizer, Resolved, ResolvedMention, Resolver};
use biolit_graph::{Alias, KnowledgeGraph, SharedGraph, UpsertOutcome};

const DEFAULT_TAGGING_TIMEOUT: Duration = Duration::from_secs(30);

/// A mention that survived validation and resolution.
struct PreparedMention {
    raw: RawMention,
    normalized: String,
    resolved: Resolved,
}

/// Everything computed for an article before the graph is touched.
struct Prepared {
    summary: ArticleSummary,
    text: String,
    mentions: Vec<PreparedMention>,
    result: IngestResult,
}

enum Stage {
    Finished(IngestResult),
    Ready(Prepared),
}

/// Turns articles into graph updates.
///
/// Tagging and resolution run without holding the graph lock. All mutations
/// for one article happen under a single write guard, so concurrent readers
/// see an article either fully merged or not at all.
#[derive(Clone)]
pub struct Pipeline {
    tagger: Arc<dyn EntityTagger>,
    normalizer: Arc<Normalizer>,
    resolver: Resolver,
    builder: CooccurrenceBuilder,
    graph: SharedGraph,
    tagging_timeout: Duration,
}

impl Pipeline {
    pub fn new(tagger: Arc<dyn EntityTagger>, resolver: Resolver) -> Self {
        Self {
            tagger,
            normalizer: Arc::new(Normalizer::new()),
            resolver,
            builder: CooccurrenceBuilder::default(),
            graph: SharedGraph::new(),
            tagging_timeout: DEFAULT_TAGGING_TIMEOUT,
        }
    }

    /// Applies the co-occurrence window and tagging timeout from `config`.
    pub fn configured(self, config: &BiolitConfig) -> Self {
        self.with_cooccurrence(config.cooccurrence)
            .with_tagging_timeout(config.tagging_timeout())
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Arc::new(normalizer);
        self
    }

    pub fn with_cooccurrence(mut self, window: CooccurrenceWindow) -> Self {
        self.builder = CooccurrenceBuilder::new(window);
        self
    }

    pub fn with_tagging_timeout(mut self, timeout: Duration) -> Self {
        self.tagging_timeout = timeout;
        self
    }

    pub fn with_graph(mut self, graph: SharedGraph) -> Self {
        self.graph = graph;
        self
    }

    pub fn graph(&self) -> &SharedGraph {
        &self.graph
    }

    pub fn tagger_name(&self) -> &str {
        self.tagger.name()
    }

    pub fn vocabularies(&self) -> Vec<String> {
        self.resolver.vocabularies()
    }

    /// Ingests one article. Problems are reported as warnings on the result;
    /// this never fails.
    pub async fn ingest(&self, article: &ArticleRecord) -> IngestResult {
        match self.prepare(article).await {
            Stage::Finished(result) => result,
            Stage::Ready(prepared) => self.commit(prepared).await,
        }
    }

    /// Ingests several articles. Tagging and resolution run concurrently;
    /// merges are applied in input order, and results come back in input
    /// order.
    pub async fn ingest_batch(&self, articles: &[ArticleRecord]) -> Vec<IngestResult> {
        tracing::info!(count = articles.len(), "Starting batch ingestion");

        let mut join_set = tokio::task::JoinSet::new();
        for (i, article) in articles.iter().enumerate() {
            let pipeline = self.clone();
            let article = article.clone();
            join_set.spawn(async move { (i, pipeline.prepare(&article).await) });
        }

        let mut stages: Vec<Option<Stage>> = articles.iter().map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((i, stage)) => stages[i] = Some(stage),
                Err(join_err) => {
                    tracing::error!(error = %join_err, "Task panicked during batch ingestion");
                }
            }
        }

        let mut results = Vec::with_capacity(articles.len());
        for (article, stage) in articles.iter().zip(stages) {
            let result = match stage {
                Some(Stage::Finished(result)) => result,
                Some(Stage::Ready(prepared)) => self.commit(prepared).await,
                None => IngestResult {
                    skipped: true,
                    warnings: vec![IngestWarning::TaggingUnavailable {
                        article_id: article.id.clone(),
                        message: "ingestion task aborted".into(),
                    }],
                    ..IngestResult::new(&article.id)
                },
            };
            results.push(result);
        }

        tracing::info!(
            count = results.len(),
            skipped = results.iter().filter(|r| r.skipped).count(),
            "Batch ingestion complete"
        );
        results
    }

    /// Ingests `articles` from scratch, one at a time, into a fresh graph that
    /// replaces the current one under a single write guard.
    ///
    /// Readers keep seeing the previous graph until the swap. Articles
    /// ingested concurrently with a rebuild are discarded by it.
    pub async fn rebuild(&self, articles: &[ArticleRecord]) -> Vec<IngestResult> {
        tracing::info!(count = articles.len(), "Rebuilding knowledge graph");
        let staging = self.clone().with_graph(SharedGraph::new());

        let mut results = Vec::with_capacity(articles.len());
        for article in articles {
            results.push(staging.ingest(article).await);
        }

        let rebuilt = std::mem::take(&mut *staging.graph.write().await);
        *self.graph.write().await = rebuilt;
        tracing::info!(count = results.len(), "Knowledge graph rebuilt");
        results
    }

    async fn prepare(&self, article: &ArticleRecord) -> Stage {
        let article_id = article.id.as_str();
        let mut result = IngestResult::new(article_id);

        if self.graph.has_article(article_id).await {
            return Stage::Finished(duplicate(result));
        }

        let text = article.text();
        let raw_mentions = match self.tag(&text).await {
            Ok(mentions) => mentions,
            Err(message) => {
                tracing::warn!(article_id, tagger = self.tagger.name(), %message, "Tagging unavailable");
                result.skipped = true;
                result.warnings.push(IngestWarning::TaggingUnavailable {
                    article_id: article_id.to_string(),
                    message,
                });
                return Stage::Finished(result);
            }
        };

        let text_len = text.chars().count();
        let mut cache: HashMap<(EntityType, String), Option<Resolved>> = HashMap::new();
        let mut mentions = Vec::with_capacity(raw_mentions.len());

        for raw in raw_mentions {
            if let Some(reason) = raw.validate(text_len) {
                result.warnings.push(malformed(article_id, &raw, reason));
                continue;
            }

            let normalized = self.normalizer.normalize(&raw.text, raw.entity_type);
            let key = (raw.entity_type, normalized);
            let resolved = match cache.get(&key) {
                Some(resolved) => resolved.clone(),
                None => {
                    let resolved = self.resolver.resolve(&key.1, key.0).await;
                    if let Some(r) = &resolved {
                        result.lookups_degraded += r.degraded;
                    }
                    cache.insert(key.clone(), resolved.clone());
                    resolved
                }
            };

            match resolved {
                Some(resolved) => mentions.push(PreparedMention {
                    raw,
                    normalized: key.1,
                    resolved,
                }),
                None => {
                    result.warnings.push(malformed(
                        article_id,
                        &raw,
                        "mention normalizes to an empty form".into(),
                    ));
                }
            }
        }

        for warning in &result.warnings {
            tracing::warn!(article_id, %warning, "Dropped mention");
        }

        Stage::Ready(Prepared {
            summary: ArticleSummary::from(article),
            text,
            mentions,
            result,
        })
    }

    async fn tag(&self, text: &str) -> Result<Vec<RawMention>, String> {
        match tokio::time::timeout(self.tagging_timeout, self.tagger.tag(text)).await {
            Ok(Ok(mentions)) => Ok(mentions),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}ms",
                self.tagging_timeout.as_millis()
            )),
        }
    }

    async fn commit(&self, prepared: Prepared) -> IngestResult {
        let Prepared {
            summary,
            text,
            mentions,
            mut result,
        } = prepared;

        let mut graph = self.graph.write().await;
        if graph.has_article(&summary.id) {
            return duplicate(result);
        }

        let mut created: BTreeSet<EntityId> = BTreeSet::new();
        let mut touched: BTreeSet<EntityId> = BTreeSet::new();
        let mut located = Vec::with_capacity(mentions.len());

        for m in &mentions {
            let surface = m.raw.text.trim();
            let display_name = m.resolved.label.as_deref().unwrap_or(surface);
            let (_, outcome) = graph.upsert_entity(
                &m.resolved.id,
                m.raw.entity_type,
                display_name,
                Alias {
                    surface,
                    normalized: &m.normalized,
                },
                &summary.id,
                &m.resolved.resolution,
            );
            if outcome == UpsertOutcome::Created {
                created.insert(m.resolved.id.clone());
            }
            touched.insert(m.resolved.id.clone());
            located.push(ResolvedMention {
                id: m.resolved.id.clone(),
                start: m.raw.start,
                end: m.raw.end,
                confidence: m.raw.confidence,
            });
        }

        result.mentions_processed = mentions.len();
        result.entities_added = created.len();
        result.entities_updated = touched.difference(&created).count();
        result.relationships_added_or_updated =
            link(&mut graph, &self.builder, &summary.id, &text, &located);

        let article_id = summary.id.clone();
        graph.record_article(summary);

        tracing::info!(
            article_id = %article_id,
            mentions = result.mentions_processed,
            entities_added = result.entities_added,
            entities_updated = result.entities_updated,
            relationships = result.relationships_added_or_updated,
            lookups_degraded = result.lookups_degraded,
            warnings = result.warnings.len(),
            "Article ingested"
        );

        result
    }
}

fn link(
    graph: &mut KnowledgeGraph,
    builder: &CooccurrenceBuilder,
    article_id: &str,
    text: &str,
    mentions: &[ResolvedMention],
) -> usize {
    // One pair can carry several window records; count edges, not records.
    let mut merged: BTreeSet<PairKey> = BTreeSet::new();
    for (pair, evidence) in builder.build(article_id, text, mentions) {
        match graph.merge_relationship(&pair.a, &pair.b, evidence) {
            Ok(_) => {
                merged.insert(pair);
            }
            Err(e) => tracing::warn!(article_id, error = %e, "Evidence not merged"),
        }
    }
    merged.len()
}

fn duplicate(mut result: IngestResult) -> IngestResult {
    tracing::info!(article_id = %result.article_id, "Article already ingested, skipping");
    result.skipped = true;
    result.warnings.push(IngestWarning::DuplicateIngestion {
        article_id: result.article_id.clone(),
    });
    result
}

fn malformed(article_id: &str, raw: &RawMention, reason: String) -> IngestWarning {
    IngestWarning::MalformedMention {
        article_id: article_id.to_string(),
        text: raw.text.clone(),
        start: raw.start,
        end: raw.end,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use biolit_core::error::{BiolitError, Result};

    /// Tags by looking the text up in a fixed table.
    struct ScriptedTagger {
        script: Vec<(&'static str, Vec<RawMention>)>,
    }

    #[async_trait]
    impl EntityTagger for ScriptedTagger {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn tag(&self, text: &str) -> Result<Vec<RawMention>> {
            self.script
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, mentions)| mentions.clone())
                .ok_or_else(|| BiolitError::Tagging("model unavailable".into()))
        }
    }

    struct SlowTagger;

    #[async_trait]
    impl EntityTagger for SlowTagger {
        fn name(&self) -> &str {
            "slow"
        }

        async fn tag(&self, _text: &str) -> Result<Vec<RawMention>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    /// Waits for a permit before tagging a lone TP53 at the start of the text.
    struct GatedTagger {
        gate: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl EntityTagger for GatedTagger {
        fn name(&self) -> &str {
            "gated"
        }

        async fn tag(&self, _text: &str) -> Result<Vec<RawMention>> {
            self.gate.notified().await;
            Ok(vec![RawMention::new(EntityType::Gene, "TP53", 0, 4, 0.9)])
        }
    }

    const A1: &str = "TP53 in breast cancer";
    const A2: &str = "BRCA1 and TP53";

    fn pipeline() -> Pipeline {
        let tagger = ScriptedTagger {
            script: vec![
                (
                    A1,
                    vec![
                        RawMention::new(EntityType::Gene, "TP53", 0, 4, 0.9),
                        RawMention::new(EntityType::Disease, "breast cancer", 8, 21, 0.8),
                    ],
                ),
                (
                    A2,
                    vec![
                        RawMention::new(EntityType::Gene, "BRCA1", 0, 5, 0.95),
                        RawMention::new(EntityType::Gene, "TP53", 10, 14, 0.7),
                    ],
                ),
                ("Nothing here", Vec::new()),
                (
                    "Bad spans",
                    vec![
                        RawMention::new(EntityType::Gene, "Bad", 0, 3, 0.9),
                        RawMention::new(EntityType::Gene, "spans", 4, 99, 0.9),
                        RawMention::new(EntityType::Gene, "---", 0, 3, 0.9),
                    ],
                ),
            ],
        };
        Pipeline::new(Arc::new(tagger), Resolver::offline())
    }

    fn article(id: &str, title: &str) -> ArticleRecord {
        ArticleRecord::new(id, title, "")
    }

    #[tokio::test]
    async fn ingest_links_cooccurring_entities() {
        let pipeline = pipeline();
        let result = pipeline.ingest(&article("a1", A1)).await;

        assert!(!result.skipped);
        assert!(result.warnings.is_empty());
        assert_eq!(result.mentions_processed, 2);
        assert_eq!(result.entities_added, 2);
        assert_eq!(result.relationships_added_or_updated, 1);

        let stats = pipeline.graph().stats().await;
        assert_eq!(stats.entity_count, 2);
        assert_eq!(stats.relationship_count, 1);
        assert_eq!(stats.article_count, 1);
    }

    #[tokio::test]
    async fn second_article_updates_shared_entity() {
        let pipeline = pipeline();
        pipeline.ingest(&article("a1", A1)).await;
        let result = pipeline.ingest(&article("a2", A2)).await;

        assert_eq!(result.entities_added, 1);
        assert_eq!(result.entities_updated, 1);

        let tp53 = EntityId::internal(EntityType::Gene, "tp53");
        let entity = pipeline.graph().entity(&tp53).await.unwrap();
        assert_eq!(entity.article_count(), 2);
        assert_eq!(entity.mention_count, 2);
    }

    #[tokio::test]
    async fn duplicate_ingestion_is_skipped() {
        let pipeline = pipeline();
        pipeline.ingest(&article("a1", A1)).await;
        let before = pipeline.graph().export().await;

        let result = pipeline.ingest(&article("a1", A1)).await;
        assert!(result.skipped);
        assert_eq!(
            result.warnings,
            vec![IngestWarning::DuplicateIngestion {
                article_id: "a1".into()
            }]
        );
        assert_eq!(pipeline.graph().export().await, before);
    }

    #[tokio::test]
    async fn tagging_failure_leaves_article_retryable() {
        let pipeline = pipeline();
        let result = pipeline.ingest(&article("a9", "unknown text")).await;

        assert!(result.skipped);
        assert!(matches!(
            result.warnings.as_slice(),
            [IngestWarning::TaggingUnavailable { .. }]
        ));
        assert!(!pipeline.graph().has_article("a9").await);
    }

    #[tokio::test]
    async fn tagging_timeout_is_reported() {
        let pipeline = Pipeline::new(Arc::new(SlowTagger), Resolver::offline())
            .with_tagging_timeout(Duration::from_millis(20));
        let result = pipeline.ingest(&article("a1", A1)).await;

        assert!(result.skipped);
        match &result.warnings[0] {
            IngestWarning::TaggingUnavailable { message, .. } => assert!(message.contains("timed out")),
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_tagging_result_is_a_noop_success() {
        let pipeline = pipeline();
        let result = pipeline.ingest(&article("a3", "Nothing here")).await;

        assert!(!result.skipped);
        assert!(result.warnings.is_empty());
        assert_eq!(result.entities_added, 0);
        assert!(pipeline.graph().has_article("a3").await);
        assert_eq!(pipeline.graph().stats().await.entity_count, 0);
    }

    #[tokio::test]
    async fn malformed_mentions_are_dropped_with_warnings() {
        let pipeline = pipeline();
        let result = pipeline.ingest(&article("a4", "Bad spans")).await;

        assert_eq!(result.mentions_processed, 1);
        assert_eq!(result.warnings.len(), 2);
        assert!(result
            .warnings
            .iter()
            .all(|w| matches!(w, IngestWarning::MalformedMention { .. })));
        assert_eq!(pipeline.graph().stats().await.entity_count, 1);
    }

    #[tokio::test]
    async fn batch_results_follow_input_order() {
        let pipeline = pipeline();
        let articles = vec![
            article("a1", A1),
            article("a2", A2),
            article("a1", A1),
            article("a9", "unknown text"),
        ];
        let results = pipeline.ingest_batch(&articles).await;

        let ids: Vec<&str> = results.iter().map(|r| r.article_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a1", "a9"]);
        assert!(!results[0].skipped);
        assert!(results[2].skipped);
        assert!(results[3].skipped);
        assert_eq!(pipeline.graph().stats().await.article_count, 2);
    }

    #[tokio::test]
    async fn rebuild_starts_from_empty() {
        let pipeline = pipeline();
        pipeline.ingest(&article("a1", A1)).await;
        pipeline.ingest(&article("a2", A2)).await;

        let results = pipeline.rebuild(&[article("a2", A2)]).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].skipped);

        let stats = pipeline.graph().stats().await;
        assert_eq!(stats.article_count, 1);
        assert_eq!(stats.entity_count, 2);
    }

    #[tokio::test]
    async fn rebuild_swaps_in_the_new_graph_at_the_end() {
        let graph = SharedGraph::new();
        let seeded = pipeline().with_graph(graph.clone());
        seeded.ingest(&article("a1", A1)).await;
        seeded.ingest(&article("a2", A2)).await;

        let gate = Arc::new(tokio::sync::Notify::new());
        let gated = Pipeline::new(
            Arc::new(GatedTagger { gate: gate.clone() }),
            Resolver::offline(),
        )
        .with_graph(graph.clone());
        let task = tokio::spawn(async move {
            let articles = vec![article("a5", "TP53 alone")];
            gated.rebuild(&articles).await
        });

        tokio::task::yield_now().await;
        assert_eq!(graph.stats().await.article_count, 2);

        gate.notify_one();
        let results = task.await.unwrap();
        assert!(!results[0].skipped);

        let stats = graph.stats().await;
        assert_eq!(stats.article_count, 1);
        assert_eq!(stats.entity_count, 1);
        assert!(graph.has_article("a5").await);
        assert!(!graph.has_article("a1").await);
    }

    #[tokio::test]
    async fn repeated_sentence_cooccurrence_counts_one_relationship() {
        const TEXT: &str = "TP53 binds MDM2. Later TP53 and MDM2 again.";
        let tagger = ScriptedTagger {
            script: vec![(
                TEXT,
                vec![
                    RawMention::new(EntityType::Gene, "TP53", 0, 4, 0.9),
                    RawMention::new(EntityType::Gene, "MDM2", 11, 15, 0.9),
                    RawMention::new(EntityType::Gene, "TP53", 23, 27, 0.8),
                    RawMention::new(EntityType::Gene, "MDM2", 32, 36, 0.8),
                ],
            )],
        };
        let pipeline = Pipeline::new(Arc::new(tagger), Resolver::offline())
            .with_cooccurrence(CooccurrenceWindow::Sentence { span: 0 });

        let result = pipeline.ingest(&article("s1", TEXT)).await;
        assert_eq!(result.relationships_added_or_updated, 1);

        let tp53 = EntityId::internal(EntityType::Gene, "tp53");
        let mdm2 = EntityId::internal(EntityType::Gene, "mdm2");
        let edge = pipeline.graph().relationship(&tp53, &mdm2).await.unwrap();
        assert_eq!(edge.evidence.len(), 2);
        assert_eq!(pipeline.graph().stats().await.relationship_count, 1);
    }
}
