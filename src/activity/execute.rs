//! Activity search execution
//!
//! Runs a structured query against the search backend and shapes the hits
//! into timeframe/document buckets for display.
//!
//! # Pipeline
//!
//! ```text
//! search (top-level filter + aggregations)
//!        ↓ total == 0 → done
//! fetch_annotations (one batch, newest first)
//!        ↓
//! bucket into timeframes → document buckets
//!        ↓
//! fetch_groups (one batch for every referenced group)
//!        ↓
//! present annotations, attach group info
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::activity::bucketing::{self, Timeframe};
use crate::activity::error::ActivityResult;
use crate::activity::presenter::PresentedAnnotation;
use crate::activity::route::group_search_path;
use crate::groups::slugify;
use crate::query::{StructuredQuery, GROUP_KEY};
use crate::search::{
    Aggregation, Aggregations, Filter, SearchBackend, SearchRequest, DEFAULT_PAGE_SIZE,
};
use crate::storage::{AnnotationStore, Group};

/// Number of tag buckets requested
pub const TAGS_AGGREGATION_LIMIT: usize = 10;

/// Number of user buckets requested
pub const USERS_AGGREGATION_LIMIT: usize = 10;

/// Display metadata for an annotation's group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupInfo {
    pub pubid: String,
    pub name: String,
    pub slug: String,
    /// Group-scoped activity page
    pub link: String,
}

impl From<&Group> for GroupInfo {
    fn from(group: &Group) -> Self {
        Self {
            pubid: group.pubid.clone(),
            name: group.name.clone(),
            slug: slugify(&group.name),
            link: group_search_path(&group.pubid),
        }
    }
}

/// A presented annotation and its group, absent if the group is gone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub annotation: PresentedAnnotation,
    pub group: Option<GroupInfo>,
}

/// Everything the activity page shows for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityResults {
    pub total: u64,
    pub aggregations: Aggregations,
    pub timeframes: Vec<Timeframe<ActivityEntry>>,
}

/// Knobs for [`execute`]
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Maximum number of annotations loaded and bucketed
    pub page_size: usize,
    /// Reference time for the "Last 7 days" timeframe
    pub now: DateTime<Utc>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            now: Utc::now(),
        }
    }
}

impl ExecuteOptions {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            ..Default::default()
        }
    }

    /// Builder method: fix the reference time
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Aggregations to request for `query`.
///
/// Tags are always aggregated. Users are aggregated only when the query is
/// limited to exactly one group.
pub fn aggregations_for(query: &StructuredQuery) -> Vec<Aggregation> {
    let mut aggregations = vec![Aggregation::Tags {
        limit: TAGS_AGGREGATION_LIMIT,
    }];

    if query.is_single_entry(GROUP_KEY) {
        aggregations.push(Aggregation::Users {
            limit: USERS_AGGREGATION_LIMIT,
        });
    }

    aggregations
}

/// Search request sent for `query`
pub fn search_request_for(query: &StructuredQuery, page_size: usize) -> SearchRequest {
    let mut request = SearchRequest::new().limit(page_size);
    request.append_filter(Filter::TopLevelAnnotations);
    for aggregation in aggregations_for(query) {
        request.append_aggregation(aggregation);
    }
    request
}

/// Run `query` and build bucketed activity results.
///
/// Issues at most three backend calls, in order: search, annotation
/// hydration, group lookup. An empty search stops after the first.
pub fn execute<B, R>(
    search: &B,
    store: &R,
    query: &StructuredQuery,
    options: &ExecuteOptions,
) -> ActivityResult<ActivityResults>
where
    B: SearchBackend + ?Sized,
    R: AnnotationStore + ?Sized,
{
    let request = search_request_for(query, options.page_size);
    let search_result = search.search(query, &request)?;

    let mut results = ActivityResults {
        total: search_result.total,
        aggregations: search_result.aggregations,
        timeframes: Vec::new(),
    };

    if results.total == 0 {
        tracing::debug!("No activity matched, skipping hydration");
        return Ok(results);
    }

    let annotations = store.fetch_annotations(&search_result.annotation_ids)?;
    let timeframes = bucketing::bucket(annotations, options.now);

    let group_pubids: BTreeSet<&str> = timeframes
        .iter()
        .flat_map(|t| t.annotations())
        .map(|a| a.groupid.as_str())
        .collect();
    let group_pubids: Vec<String> = group_pubids.into_iter().map(str::to_string).collect();

    let groups: HashMap<String, GroupInfo> = store
        .fetch_groups(&group_pubids)?
        .iter()
        .map(|g| (g.pubid.clone(), GroupInfo::from(g)))
        .collect();

    results.timeframes = timeframes
        .into_iter()
        .map(|timeframe| {
            timeframe.map(|annotation| ActivityEntry {
                annotation: PresentedAnnotation::from(&annotation),
                group: groups.get(&annotation.groupid).cloned(),
            })
        })
        .collect();

    tracing::debug!(
        total = results.total,
        timeframes = results.timeframes.len(),
        groups = groups.len(),
        "Activity results built"
    );

    Ok(results)
}
