//! Dashboard analytics over a user's leads
//!
//! Pure computation; the handler loads the leads and serializes the report.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use pathway_common::models::Audience;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Score at or above which a lead counts as high quality
pub const HIGH_QUALITY_SCORE: i64 = 80;

/// Days covered by the completion trend
pub const TREND_DAYS: i64 = 30;

/// Inclusive score buckets shown in the distribution chart
const SCORE_RANGES: [(i64, i64, &str); 5] = [
    (0, 20, "0-20"),
    (21, 40, "21-40"),
    (41, 60, "41-60"),
    (61, 80, "61-80"),
    (81, 100, "81-100"),
];

/// The slice of a lead analytics needs
#[derive(Debug, Clone)]
pub struct LeadSample {
    pub assessment_id: String,
    pub assessment_title: String,
    pub audience: Audience,
    pub score: i64,
    pub source: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub total_leads: usize,
    pub completed_leads: usize,
    pub high_quality_leads: usize,
    pub avg_score: i64,
    pub top_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreRange {
    pub range: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AudienceSlice {
    pub name: &'static str,
    pub value: usize,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentPerformance {
    pub title: String,
    pub count: usize,
    pub avg_score: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyCompletions {
    pub date: String,
    pub completions: usize,
}

/// Body of `GET /api/analytics`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub key_metrics: KeyMetrics,
    pub score_ranges: Vec<ScoreRange>,
    pub audience_data: Vec<AudienceSlice>,
    pub source_chart_data: Vec<SourceCount>,
    pub assessment_performance: Vec<AssessmentPerformance>,
    pub completion_trends: Vec<DailyCompletions>,
}

fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as i64
}

fn source_label(source: &Option<String>) -> String {
    source
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("direct")
        .to_string()
}

/// Build the report for `leads` as of `now`
pub fn compute(leads: &[LeadSample], now: DateTime<Utc>) -> AnalyticsReport {
    let total = leads.len();
    let score_sum: i64 = leads.iter().map(|l| l.score).sum();

    // Sources, most frequent first; ties by name
    let mut by_source: HashMap<String, usize> = HashMap::new();
    for lead in leads {
        *by_source.entry(source_label(&lead.source)).or_default() += 1;
    }
    let mut source_chart_data: Vec<SourceCount> = by_source
        .into_iter()
        .map(|(source, count)| SourceCount { source, count })
        .collect();
    source_chart_data.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.source.cmp(&b.source)));

    let key_metrics = KeyMetrics {
        total_leads: total,
        completed_leads: total,
        high_quality_leads: leads.iter().filter(|l| l.score >= HIGH_QUALITY_SCORE).count(),
        avg_score: rounded_average(score_sum, total),
        top_source: source_chart_data.first().map(|s| s.source.clone()),
    };

    let score_ranges = SCORE_RANGES
        .iter()
        .map(|&(low, high, range)| ScoreRange {
            range,
            count: leads
                .iter()
                .filter(|l| l.score >= low && l.score <= high)
                .count(),
        })
        .collect();

    let audience_data = [
        (Audience::Individual, "Individual", "#2563eb"),
        (Audience::Business, "Business", "#7c3aed"),
    ]
    .into_iter()
    .map(|(audience, name, color)| AudienceSlice {
        name,
        value: leads.iter().filter(|l| l.audience == audience).count(),
        color,
    })
    .collect();

    // Per assessment, in first-seen order
    let mut performance: Vec<(String, String, usize, i64)> = Vec::new();
    for lead in leads {
        match performance.iter_mut().find(|p| p.0 == lead.assessment_id) {
            Some(entry) => {
                entry.2 += 1;
                entry.3 += lead.score;
            }
            None => performance.push((
                lead.assessment_id.clone(),
                lead.assessment_title.clone(),
                1,
                lead.score,
            )),
        }
    }
    let assessment_performance = performance
        .into_iter()
        .map(|(_, title, count, sum)| AssessmentPerformance {
            title,
            count,
            avg_score: rounded_average(sum, count),
        })
        .collect();

    AnalyticsReport {
        key_metrics,
        score_ranges,
        audience_data,
        source_chart_data,
        assessment_performance,
        completion_trends: completion_trends(leads, now),
    }
}

/// Completions per day for the last [`TREND_DAYS`] days, oldest first.
///
/// Only days with at least one completion are listed.
fn completion_trends(leads: &[LeadSample], now: DateTime<Utc>) -> Vec<DailyCompletions> {
    let since = now - Duration::days(TREND_DAYS);
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for lead in leads.iter().filter(|l| l.completed_at >= since && l.completed_at <= now) {
        *per_day.entry(lead.completed_at.date_naive()).or_default() += 1;
    }

    per_day
        .into_iter()
        .map(|(day, completions)| DailyCompletions {
            date: day.format("%Y-%m-%d").to_string(),
            completions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn sample(assessment: &str, score: i64, source: Option<&str>, days_ago: i64) -> LeadSample {
        LeadSample {
            assessment_id: assessment.to_string(),
            assessment_title: format!("Title {}", assessment),
            audience: if assessment == "b" {
                Audience::Business
            } else {
                Audience::Individual
            },
            score,
            source: source.map(str::to_string),
            completed_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = compute(&[], now());

        assert_eq!(report.key_metrics.total_leads, 0);
        assert_eq!(report.key_metrics.avg_score, 0);
        assert_eq!(report.key_metrics.top_source, None);
        assert_eq!(report.score_ranges.len(), 5);
        assert!(report.score_ranges.iter().all(|r| r.count == 0));
        assert!(report.completion_trends.is_empty());
    }

    #[test]
    fn test_key_metrics_and_ranges() {
        let leads = vec![
            sample("a", 80, Some("facebook"), 1),
            sample("a", 81, Some("facebook"), 1),
            sample("b", 20, None, 2),
            sample("b", 21, Some("google"), 40),
        ];
        let report = compute(&leads, now());

        assert_eq!(report.key_metrics.total_leads, 4);
        assert_eq!(report.key_metrics.high_quality_leads, 2);
        // (80 + 81 + 20 + 21) / 4 = 50.5
        assert_eq!(report.key_metrics.avg_score, 51);
        assert_eq!(report.key_metrics.top_source.as_deref(), Some("facebook"));

        let counts: Vec<usize> = report.score_ranges.iter().map(|r| r.count).collect();
        assert_eq!(counts, vec![1, 1, 0, 1, 1]);

        assert_eq!(report.audience_data[0].value, 2);
        assert_eq!(report.audience_data[1].value, 2);
    }

    #[test]
    fn test_sources_sorted_descending() {
        let leads = vec![
            sample("a", 50, Some("google"), 1),
            sample("a", 50, None, 1),
            sample("a", 50, Some("google"), 1),
            sample("a", 50, Some("ads"), 1),
        ];
        let report = compute(&leads, now());

        let sources: Vec<(&str, usize)> = report
            .source_chart_data
            .iter()
            .map(|s| (s.source.as_str(), s.count))
            .collect();
        assert_eq!(sources, vec![("google", 2), ("ads", 1), ("direct", 1)]);
    }

    #[test]
    fn test_assessment_performance() {
        let leads = vec![sample("a", 70, None, 1), sample("b", 90, None, 1), sample("a", 75, None, 1)];
        let report = compute(&leads, now());

        assert_eq!(report.assessment_performance.len(), 2);
        assert_eq!(report.assessment_performance[0].title, "Title a");
        assert_eq!(report.assessment_performance[0].count, 2);
        assert_eq!(report.assessment_performance[0].avg_score, 73);
        assert_eq!(report.assessment_performance[1].avg_score, 90);
    }

    #[test]
    fn test_completion_trends_window() {
        let leads = vec![
            sample("a", 1, None, 0),
            sample("a", 1, None, 3),
            sample("a", 1, None, 3),
            sample("a", 1, None, 31),
        ];
        let report = compute(&leads, now());

        assert_eq!(
            report.completion_trends,
            vec![
                DailyCompletions {
                    date: "2024-06-27".to_string(),
                    completions: 2
                },
                DailyCompletions {
                    date: "2024-06-30".to_string(),
                    completions: 1
                },
            ]
        );
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(compute(&[sample("a", 90, None, 0)], now())).unwrap();

        assert_eq!(value["keyMetrics"]["highQualityLeads"], 1);
        assert_eq!(value["scoreRanges"][4]["range"], "81-100");
        assert_eq!(value["assessmentPerformance"][0]["avgScore"], 90);
        assert!(value["completionTrends"].is_array());
    }
}
