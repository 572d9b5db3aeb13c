//! The staged auto-repair engine.
//!
//! Per page, stages run strictly in order (targeted fix, escalation, orphan
//! cleanup, source replacement, re-verification) because each
//! stage's output can invalidate offsets or counts used by the next. The
//! stage sequencing is a small explicit state machine with a pure transition
//! function so each stage tests in isolation. Across pages, a bounded
//! concurrency window runs pages as independent units: one page's failure
//! never touches another.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use regex::Regex;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::document::{apply_edits, normalize_blank_lines, resolve_edit};
use crate::extraction::ExtractionPipeline;
use crate::footnote::{
    claim_section, classify_definition, has_inline_reference, parse_definitions, CitationFormat,
};
use crate::judgment::{FlaggedCitation, JudgmentService, SourceSearch, Verdict};
use crate::store::StoreHandle;
use crate::verify::{domain_of, SourceFetcher};

use super::evidence::{enrich_flagged, removable_footnotes, section_evidence};
use super::report::{BatchRepairReport, RepairReport, ReverifyDelta, StageCounts};
use super::safety::{check_section_rewrite, LengthBounds};

/// Repair engine configuration.
#[derive(Debug, Clone)]
pub struct RepairConfig {
    /// Unsupported citations below this accuracy score qualify for source
    /// replacement.
    pub source_replace_threshold: f64,
    /// Section-rewrite length bounds.
    pub length_bounds: LengthBounds,
    /// Allow one extra fix pass when re-verification shows strict
    /// improvement.
    pub allow_second_pass: bool,
    /// Pages repaired concurrently in a batch.
    pub page_concurrency: usize,
    /// Tool name recorded in the edit log.
    pub tool_name: String,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            source_replace_threshold: 0.3,
            length_bounds: LengthBounds::default(),
            allow_second_pass: true,
            page_concurrency: 3,
            tool_name: "citeguard-repair".to_string(),
        }
    }
}

impl RepairConfig {
    pub fn with_source_replace_threshold(mut self, threshold: f64) -> Self {
        self.source_replace_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_page_concurrency(mut self, n: usize) -> Self {
        self.page_concurrency = n.max(1);
        self
    }

    pub fn with_second_pass(mut self, allow: bool) -> Self {
        self.allow_second_pass = allow;
        self
    }
}

/// The repair stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStage {
    Targeted,
    Escalate,
    Cleanup,
    SourceReplace,
    Reverify,
    Done,
}

/// Inputs to the stage-transition function.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageOutcome {
    /// Actionable proposals produced by the targeted stage this pass.
    pub proposals: usize,
    /// Whether any stage has changed the page so far.
    pub changed: bool,
    /// Whether re-verification showed strictly fewer flagged citations.
    pub improved: bool,
    /// Flagged citations remaining after re-verification.
    pub remaining_flagged: usize,
    /// Current pass number, 1-based.
    pub pass: usize,
    /// Config: second pass permitted at all.
    pub allow_second_pass: bool,
}

/// Pure stage transition.
///
/// Escalation runs only when the targeted stage produced zero proposals.
/// Re-verification runs only when something changed. A second pass happens
/// only on strict improvement with work left, never more than once.
pub fn next_stage(stage: RepairStage, outcome: &StageOutcome) -> RepairStage {
    match stage {
        RepairStage::Targeted => {
            if outcome.proposals == 0 {
                RepairStage::Escalate
            } else {
                RepairStage::Cleanup
            }
        }
        RepairStage::Escalate => RepairStage::Cleanup,
        RepairStage::Cleanup => RepairStage::SourceReplace,
        RepairStage::SourceReplace => {
            if outcome.changed {
                RepairStage::Reverify
            } else {
                RepairStage::Done
            }
        }
        RepairStage::Reverify => {
            if outcome.improved
                && outcome.remaining_flagged > 0
                && outcome.pass < 2
                && outcome.allow_second_pass
            {
                RepairStage::Targeted
            } else {
                RepairStage::Done
            }
        }
        RepairStage::Done => RepairStage::Done,
    }
}

/// One page queued for repair.
#[derive(Debug, Clone)]
pub struct RepairRequest {
    pub page_id: String,
    pub text: String,
    pub flagged: Vec<FlaggedCitation>,
}

/// Autonomous citation repair for flagged pages.
pub struct RepairEngine {
    judgment: Arc<dyn JudgmentService>,
    search: Arc<dyn SourceSearch>,
    store: StoreHandle,
    extraction: ExtractionPipeline,
    config: RepairConfig,
}

impl RepairEngine {
    pub fn new(
        judgment: Arc<dyn JudgmentService>,
        search: Arc<dyn SourceSearch>,
        fetcher: Arc<SourceFetcher>,
        store: StoreHandle,
        config: RepairConfig,
    ) -> Self {
        let extraction =
            ExtractionPipeline::new(Arc::clone(&judgment), fetcher, store.clone());
        Self {
            judgment,
            search,
            store,
            extraction,
            config,
        }
    }

    /// Repair one page. Failures are contained per stage; the report always
    /// comes back.
    pub async fn repair_page(
        &self,
        page_id: &str,
        text: &str,
        flagged: &[FlaggedCitation],
    ) -> RepairReport {
        let mut report = RepairReport::new(page_id, text, flagged.len());
        let mut doc = text.to_string();
        let mut current: Vec<FlaggedCitation> = flagged.to_vec();
        let mut outcome = StageOutcome {
            pass: 1,
            allow_second_pass: self.config.allow_second_pass,
            ..StageOutcome::default()
        };
        report.passes = 1;
        let mut stage = RepairStage::Targeted;

        while stage != RepairStage::Done {
            match stage {
                RepairStage::Targeted => {
                    let counts = self.stage_targeted(page_id, &mut doc, &current).await;
                    outcome.proposals = counts.proposed;
                    outcome.changed |= counts.applied > 0;
                    report.targeted.proposed += counts.proposed;
                    report.targeted.applied += counts.applied;
                    report.targeted.skipped += counts.skipped;
                }
                RepairStage::Escalate => {
                    let (attempted, applied, rejected) =
                        self.stage_escalate(page_id, &mut doc, &current).await;
                    outcome.changed |= applied > 0;
                    report.escalations_attempted += attempted;
                    report.escalations_applied += applied;
                    report.escalations_rejected += rejected;
                }
                RepairStage::Cleanup => {
                    let removed = self.stage_cleanup(page_id, &mut doc);
                    outcome.changed |= removed > 0;
                    report.orphans_removed += removed;
                }
                RepairStage::SourceReplace => {
                    let replaced = self.stage_source_replace(page_id, &mut doc, &current).await;
                    outcome.changed |= replaced > 0;
                    report.sources_replaced += replaced;
                }
                RepairStage::Reverify => {
                    let after = self.extraction.flagged_after_check(page_id, &doc).await;
                    outcome.improved = after.len() < current.len();
                    outcome.remaining_flagged = after.len();
                    report.flagged_after = Some(after.len());
                    report.delta = Some(ReverifyDelta::classify(report.flagged_before, after.len()));
                    current = after;
                }
                RepairStage::Done => unreachable!(),
            }

            let next = next_stage(stage, &outcome);
            if stage == RepairStage::Reverify && next == RepairStage::Targeted {
                outcome.pass += 1;
                outcome.proposals = 0;
                report.passes = outcome.pass;
            }
            stage = next;
        }

        if report.delta == Some(ReverifyDelta::Regressed) {
            warn!(
                page_id,
                before = report.flagged_before,
                after = report.flagged_after.unwrap_or(0),
                "repair regressed: more citations flagged than before"
            );
        }

        report.changed = outcome.changed;
        report.text = doc;
        report
    }

    /// Repair a batch of pages with bounded page-level concurrency.
    pub async fn repair_batch(&self, requests: Vec<RepairRequest>) -> BatchRepairReport {
        let semaphore = Arc::new(Semaphore::new(self.config.page_concurrency));

        let tasks: Vec<_> = requests
            .iter()
            .map(|req| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore
                        .acquire()
                        .await
                        .expect("Semaphore closed unexpectedly");
                    self.repair_page(&req.page_id, &req.text, &req.flagged).await
                }
            })
            .collect();

        let pages = join_all(tasks).await;
        BatchRepairReport { pages }
    }

    // ==================== Stages ====================

    async fn stage_targeted(
        &self,
        page_id: &str,
        doc: &mut String,
        flagged: &[FlaggedCitation],
    ) -> StageCounts {
        if flagged.is_empty() {
            return StageCounts::default();
        }

        let enriched = enrich_flagged(flagged, &self.store);
        let proposals = match self.judgment.propose_fixes(&enriched, doc).await {
            Ok(p) => p,
            Err(e) => {
                warn!(page_id, error = %e, "fix generation failed; stage skipped");
                return StageCounts::default();
            }
        };

        let actionable: Vec<_> = proposals.into_iter().filter(|p| p.is_actionable()).collect();
        let proposed = actionable.len();

        let mut edits = Vec::new();
        let mut stale = 0usize;
        for proposal in &actionable {
            match resolve_edit(doc, &proposal.original, &proposal.replacement) {
                Some(edit) => edits.push(edit),
                None => {
                    warn!(
                        page_id,
                        footnote = proposal.footnote,
                        "proposed fix text not found in document; skipped"
                    );
                    stale += 1;
                }
            }
        }

        let outcome = apply_edits(doc, edits);
        let counts = StageCounts {
            proposed,
            applied: outcome.applied,
            skipped: outcome.skipped.len() + stale,
        };
        *doc = outcome.text;

        if counts.applied > 0 {
            info!(page_id, applied = counts.applied, "targeted fixes applied");
            self.store.log_edit(
                page_id,
                &self.config.tool_name,
                "automated",
                &format!(
                    "targeted fix: applied {}, skipped {}",
                    counts.applied, counts.skipped
                ),
            );
        }
        counts
    }

    async fn stage_escalate(
        &self,
        page_id: &str,
        doc: &mut String,
        flagged: &[FlaggedCitation],
    ) -> (usize, usize, usize) {
        if flagged.is_empty() {
            return (0, 0, 0);
        }

        // Unique heading-bounded sections containing a flagged citation.
        // These stop at the definitions block, so a rewrite never swallows
        // definition lines.
        let mut sections: Vec<String> = Vec::new();
        for citation in flagged {
            if let Some(section) = claim_section(doc, citation.footnote) {
                if !sections.contains(&section) {
                    sections.push(section);
                }
            }
        }

        let mut attempted = 0usize;
        let mut applied = 0usize;
        let mut rejected = 0usize;

        for section_text in sections {
            attempted += 1;
            let heading = section_text.lines().next().unwrap_or("").to_string();

            // Evidence for every footnote in the section, not only flagged
            // ones: the rewrite must know what it has to keep supported.
            let evidence = section_evidence(page_id, &section_text, &self.store);
            let (_, preserved) = removable_footnotes(&section_text, flagged);

            let rewritten = match self.judgment.rewrite_section(&section_text, &evidence).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(page_id, heading = %heading, error = %e, "section rewrite failed; section skipped");
                    rejected += 1;
                    continue;
                }
            };

            match check_section_rewrite(
                &section_text,
                &rewritten,
                &preserved,
                self.config.length_bounds,
            ) {
                Ok(()) => {
                    // Locate by exact substring; line numbers may have
                    // drifted since the section was extracted.
                    if let Some(pos) = doc.find(&section_text) {
                        doc.replace_range(pos..pos + section_text.len(), &rewritten);
                        applied += 1;
                        self.store.log_edit(
                            page_id,
                            &self.config.tool_name,
                            "automated",
                            &format!("section rewrite applied: {}", heading),
                        );
                    } else {
                        warn!(page_id, heading = %heading, "section text drifted before rewrite; skipped");
                        rejected += 1;
                    }
                }
                Err(rejection) => {
                    warn!(page_id, heading = %heading, %rejection, "section rewrite rejected");
                    rejected += 1;
                }
            }
        }

        (attempted, applied, rejected)
    }

    fn stage_cleanup(&self, page_id: &str, doc: &mut String) -> usize {
        let (cleaned, removed) = remove_orphaned_definitions(doc);
        if removed.is_empty() {
            return 0;
        }
        *doc = cleaned;
        self.store.log_edit(
            page_id,
            &self.config.tool_name,
            "automated",
            &format!(
                "removed {} orphaned footnote definition(s): {:?}",
                removed.len(),
                removed
            ),
        );
        removed.len()
    }

    async fn stage_source_replace(
        &self,
        page_id: &str,
        doc: &mut String,
        flagged: &[FlaggedCitation],
    ) -> usize {
        let mut replaced = 0usize;

        for citation in flagged {
            if citation.verdict != Verdict::Unsupported
                || citation.score >= self.config.source_replace_threshold
            {
                continue;
            }
            let Some(current_url) = citation.source_url.as_deref() else {
                continue;
            };
            let current_domain = domain_of(current_url);

            let query = build_search_query(&citation.claim);
            if query.is_empty() {
                continue;
            }

            let hits = match self.search.search(&query).await {
                Ok(h) => h,
                Err(e) => {
                    warn!(page_id, footnote = citation.footnote, error = %e, "source search failed; citation skipped");
                    continue;
                }
            };

            // Exclude the domain that already failed to support the claim.
            let replacement = hits.into_iter().find(|hit| {
                match (domain_of(&hit.url), current_domain.as_deref()) {
                    (Some(hit_domain), Some(current)) => hit_domain != current,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            });

            if let Some(hit) = replacement {
                if let Some(updated) =
                    replace_source_in_definition(doc, citation.footnote, &hit.url, &hit.title)
                {
                    *doc = updated;
                    replaced += 1;
                    self.store.log_edit(
                        page_id,
                        &self.config.tool_name,
                        "automated",
                        &format!(
                            "replaced unsupported source for [^{}] with {}",
                            citation.footnote, hit.url
                        ),
                    );
                }
            }
        }

        replaced
    }
}

/// Delete definition lines (and their continuations) whose footnote number no
/// longer appears inline anywhere, then collapse resulting blank runs.
pub fn remove_orphaned_definitions(text: &str) -> (String, Vec<u32>) {
    let orphans: BTreeSet<u32> = parse_definitions(text)
        .into_iter()
        .map(|d| d.number)
        .filter(|&n| !has_inline_reference(text, n))
        .collect();

    if orphans.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let def_re = Regex::new(r"^\[\^(\d+)\]:").unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let drop = def_re
            .captures(lines[i])
            .and_then(|cap| cap[1].parse::<u32>().ok())
            .map(|n| orphans.contains(&n))
            .unwrap_or(false);
        if drop {
            i += 1;
            // Continuation lines go with the definition.
            while i < lines.len()
                && !lines[i].trim().is_empty()
                && lines[i].starts_with([' ', '\t'])
                && !def_re.is_match(lines[i])
            {
                i += 1;
            }
        } else {
            kept.push(lines[i]);
            i += 1;
        }
    }

    (
        normalize_blank_lines(&kept.join("\n")),
        orphans.into_iter().collect(),
    )
}

/// Build a source-discovery query from claim text: strip embedded markers and
/// markup, then take the first sentence, else truncate to 200 characters.
pub fn build_search_query(claim: &str) -> String {
    let marker_re = Regex::new(r"<EntityLink\b[^>]*/>").unwrap();
    let footnote_re = Regex::new(r"\[\^[A-Za-z0-9]+\]").unwrap();
    let link_re = Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap();

    let stripped = marker_re.replace_all(claim, " ");
    let stripped = footnote_re.replace_all(&stripped, "");
    let stripped = link_re.replace_all(&stripped, "$1");
    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    // First sentence when one exists, else a 200-character prefix.
    if let Some(end) = cleaned.find(". ") {
        return cleaned[..end + 1].to_string();
    }
    if cleaned.ends_with('.') {
        return cleaned;
    }
    cleaned.chars().take(200).collect()
}

/// Rewrite only the URL (and title where the shape carries one) inside a
/// footnote's definition line.
pub fn replace_source_in_definition(
    text: &str,
    footnote: u32,
    new_url: &str,
    new_title: &str,
) -> Option<String> {
    let def_re = Regex::new(&format!(r"(?m)^\[\^{}\]:\s*(.*)$", footnote)).unwrap();
    let captures = def_re.captures(text)?;
    let line = captures.get(0)?.as_str();
    let body = captures.get(1)?.as_str();

    let new_body = match classify_definition(body) {
        CitationFormat::MarkdownLink { .. } => {
            let link_re = Regex::new(r"\[[^\]]+\]\((https?://[^)\s]+)\)").unwrap();
            let replacement = format!("[{}]({})", new_title, new_url);
            link_re
                .replace(body, regex::NoExpand(&replacement))
                .to_string()
        }
        CitationFormat::TextThenUrl { url, .. } | CitationFormat::BareUrl { url } => {
            body.replacen(url.as_str(), new_url, 1)
        }
        CitationFormat::NoUrl => return None,
    };

    let new_line = format!("[^{}]: {}", footnote, new_body);
    Some(text.replacen(line, &new_line, 1))
}
