use std::collections::HashMap;

use regex::Regex;

use super::model::{DayRecord, IntervalRecord, ParentChildSet};
use crate::domain::time::{interval_duration_seconds, time_str_to_seconds};

const DEFAULT_STATUS: &str = "False";
const DEFAULT_SLEEP: &str = "False";
const DEFAULT_EXERCISE: &str = "False";
const DEFAULT_GETUP: &str = "00:00";

/// Streaming parser for the day-block log format.
///
/// Feed it file contents with [`parse_content`](Self::parse_content) and
/// finish with [`commit_all`](Self::commit_all) so the last day's buffer is
/// flushed. Committed days land in `days`/`records`; the induced project
/// hierarchy accumulates in `parent_child_pairs`.
pub struct LogParser {
    time_record_regex: Regex,

    current_date: String,
    current_status: String,
    current_sleep: String,
    current_remark: String,
    current_getup_time: String,
    current_exercise: String,
    buffered_records_for_day: Vec<IntervalRecord>,
    current_date_committed: bool,

    pub days: Vec<DayRecord>,
    pub records: Vec<IntervalRecord>,
    pub parent_child_pairs: ParentChildSet,
}

impl LogParser {
    /// The configured top-level mapping (e.g. `study -> STUDY`) is seeded
    /// into the pair set once, up front; re-inserting it per time line
    /// would be wasted work on the hot path.
    #[must_use]
    pub fn new(top_level_parents: &HashMap<String, String>) -> Self {
        let mut parent_child_pairs = ParentChildSet::new();
        for (child, parent) in top_level_parents {
            parent_child_pairs.insert((child.clone(), parent.clone()));
        }

        Self {
            time_record_regex: Regex::new(r"^([0-9]{2}:[0-9]{2})~([0-9]{2}:[0-9]{2})(.+)$")
                .expect("time record pattern is valid"),
            current_date: String::new(),
            current_status: DEFAULT_STATUS.to_string(),
            current_sleep: DEFAULT_SLEEP.to_string(),
            current_remark: String::new(),
            current_getup_time: DEFAULT_GETUP.to_string(),
            current_exercise: DEFAULT_EXERCISE.to_string(),
            buffered_records_for_day: Vec::new(),
            current_date_committed: false,
            days: Vec::new(),
            records: Vec::new(),
            parent_child_pairs,
        }
    }

    pub fn parse_content(&mut self, content: &str) {
        for line in content.lines() {
            self.process_line(line.trim());
        }
    }

    /// Commits the last buffered day. Must be called once after the final
    /// file; `Date:` headers only commit the *previous* day.
    pub fn commit_all(&mut self) {
        self.store_previous_date_data();
    }

    fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        if let Some(rest) = line.strip_prefix("Date:") {
            self.store_previous_date_data();
            self.handle_date_line(rest.trim());
        } else if let Some(rest) = line.strip_prefix("Status:") {
            self.current_status = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Sleep:") {
            self.current_sleep = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Remark:") {
            self.current_remark = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Getup:") {
            self.current_getup_time = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Exercise:") {
            self.current_exercise = rest.trim().to_string();
        } else if line.contains('~') {
            self.handle_time_record_line(line);
        }
        // anything else is a comment or future extension; skip it
    }

    fn handle_date_line(&mut self, date: &str) {
        if date.is_empty() {
            return;
        }
        self.current_date = date.to_string();
        self.current_status = DEFAULT_STATUS.to_string();
        self.current_sleep = DEFAULT_SLEEP.to_string();
        self.current_remark = String::new();
        self.current_getup_time = DEFAULT_GETUP.to_string();
        self.current_exercise = DEFAULT_EXERCISE.to_string();
        self.buffered_records_for_day.clear();
        self.current_date_committed = false;
    }

    fn handle_time_record_line(&mut self, line: &str) {
        let Some(captures) = self.time_record_regex.captures(line) else {
            return;
        };
        let start_time = &captures[1];
        let end_time = &captures[2];
        let project_path = &captures[3];

        let (Some(start_seconds), Some(end_seconds)) =
            (time_str_to_seconds(start_time), time_str_to_seconds(end_time))
        else {
            return;
        };

        self.buffered_records_for_day.push(IntervalRecord {
            date: self.current_date.clone(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            project_path: project_path.to_string(),
            duration_seconds: interval_duration_seconds(start_seconds, end_seconds),
        });
        self.process_project_path(project_path);
    }

    /// `a_b_c` induces the pairs `(a_b, a)` and `(a_b_c, a_b)`.
    fn process_project_path(&mut self, project_path: &str) {
        let segments: Vec<&str> = project_path.split('_').collect();
        if segments.len() < 2 {
            return;
        }

        let mut parent_path = segments[0].to_string();
        for segment in &segments[1..] {
            let child_path = format!("{parent_path}_{segment}");
            self.parent_child_pairs
                .insert((child_path.clone(), parent_path));
            parent_path = child_path;
        }
    }

    fn store_previous_date_data(&mut self) {
        if self.current_date.is_empty() || self.current_date_committed {
            return;
        }

        self.days.push(DayRecord {
            date: self.current_date.clone(),
            status: std::mem::take(&mut self.current_status),
            sleep: std::mem::take(&mut self.current_sleep),
            remark: std::mem::take(&mut self.current_remark),
            getup_time: std::mem::take(&mut self.current_getup_time),
            exercise: std::mem::take(&mut self.current_exercise),
        });
        self.records.append(&mut self.buffered_records_for_day);
        self.current_date_committed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ParserSpec {
        content: String,
        mapping: HashMap<String, String>,
    }

    impl ParserSpec {
        fn new(content: &str) -> Self {
            Self {
                content: content.to_string(),
                mapping: HashMap::new(),
            }
        }

        fn with_mapping(mut self, child: &str, parent: &str) -> Self {
            self.mapping.insert(child.to_string(), parent.to_string());
            self
        }

        fn when_parsed(self) -> LogParser {
            let mut parser = LogParser::new(&self.mapping);
            parser.parse_content(&self.content);
            parser.commit_all();
            parser
        }
    }

    #[test]
    fn test_parse_single_day_block() {
        let parser = ParserSpec::new(
            "Date: 2024-10-31\n\
             Status: True\n\
             Sleep: False\n\
             Getup: 07:30\n\
             Exercise: False\n\
             Remark: busy day\n\
             09:00~10:00study_math\n\
             10:00~10:15rest_short\n",
        )
        .when_parsed();

        assert_eq!(parser.days.len(), 1);
        let day = &parser.days[0];
        assert_eq!(day.date, "2024-10-31");
        assert_eq!(day.status, "True");
        assert_eq!(day.sleep, "False");
        assert_eq!(day.getup_time, "07:30");
        assert_eq!(day.remark, "busy day");

        assert_eq!(parser.records.len(), 2);
        assert_eq!(parser.records[0].project_path, "study_math");
        assert_eq!(parser.records[0].duration_seconds, 3600);
        assert_eq!(parser.records[1].duration_seconds, 900);
    }

    #[test]
    fn test_midnight_wrap_duration() {
        let parser = ParserSpec::new(
            "Date: 2025-01-01\n\
             Getup: 06:00\n\
             23:30~00:15sleep_night\n",
        )
        .when_parsed();

        assert_eq!(parser.records.len(), 1);
        assert_eq!(parser.records[0].duration_seconds, 2700);
    }

    #[test]
    fn test_metadata_resets_between_days() {
        let parser = ParserSpec::new(
            "Date: 2025-01-01\n\
             Status: True\n\
             Getup: 08:00\n\
             09:00~10:00study\n\
             Date: 2025-01-02\n\
             10:00~11:00rest\n",
        )
        .when_parsed();

        assert_eq!(parser.days.len(), 2);
        assert_eq!(parser.days[0].status, "True");
        assert_eq!(parser.days[1].status, "False");
        assert_eq!(parser.days[1].getup_time, "00:00");
    }

    #[test]
    fn test_parent_child_closure() {
        let parser = ParserSpec::new(
            "Date: 2025-01-01\n\
             09:00~10:00study_english_words\n",
        )
        .when_parsed();

        let pairs: Vec<_> = parser.parent_child_pairs.iter().cloned().collect();
        assert_eq!(
            pairs,
            vec![
                ("study_english".to_string(), "study".to_string()),
                ("study_english_words".to_string(), "study_english".to_string()),
            ]
        );
        for (child, parent) in &parser.parent_child_pairs {
            assert!(child.starts_with(&format!("{parent}_")));
        }
    }

    #[test]
    fn test_top_level_mapping_is_seeded_once() {
        let parser = ParserSpec::new("Date: 2025-01-01\n09:00~10:00study_math\n")
            .with_mapping("study", "STUDY")
            .when_parsed();

        assert!(parser
            .parent_child_pairs
            .contains(&("study".to_string(), "STUDY".to_string())));
        assert!(parser
            .parent_child_pairs
            .contains(&("study_math".to_string(), "study".to_string())));
    }

    #[test]
    fn test_malformed_time_lines_are_ignored() {
        let parser = ParserSpec::new(
            "Date: 2025-01-01\n\
             9:00~10:00study\n\
             25:00~26:00study\n\
             09:00~10:00\n\
             ~~~\n\
             this line means nothing\n\
             09:00~10:00study\n",
        )
        .when_parsed();

        assert_eq!(parser.records.len(), 1);
        assert_eq!(parser.records[0].project_path, "study");
    }

    #[test]
    fn test_lines_before_first_date_are_dropped() {
        let parser = ParserSpec::new("09:00~10:00study\nDate: 2025-01-01\n").when_parsed();
        assert_eq!(parser.days.len(), 1);
        // the interval was buffered without a date and discarded on reset
        assert!(parser.records.is_empty());
    }

    #[test]
    fn test_commit_all_is_required_for_the_last_day() {
        let mut parser = LogParser::new(&HashMap::new());
        parser.parse_content("Date: 2025-01-01\n09:00~10:00study\n");
        assert!(parser.days.is_empty());
        parser.commit_all();
        assert_eq!(parser.days.len(), 1);
        assert_eq!(parser.records.len(), 1);
    }

    #[test]
    fn test_commit_all_is_idempotent() {
        let mut parser = LogParser::new(&HashMap::new());
        parser.parse_content("Date: 2025-01-01\n09:00~10:00study\n");
        parser.commit_all();
        parser.commit_all();
        assert_eq!(parser.days.len(), 1);
    }

    #[test]
    fn test_total_duration_matches_interval_sum() {
        let parser = ParserSpec::new(
            "Date: 2025-01-01\n\
             08:00~09:30study_math\n\
             10:00~10:45rest\n\
             23:00~01:00sleep_night\n",
        )
        .when_parsed();

        let total: i64 = parser.records.iter().map(|r| r.duration_seconds).sum();
        assert_eq!(total, 5400 + 2700 + 7200);
    }
}
