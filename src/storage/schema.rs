//! Centralized table and column names. All SQL goes through these
//! constants so a rename stays a one-line change.

pub mod day {
    pub const TABLE: &str = "days";
    pub const DATE: &str = "date";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const STATUS: &str = "status";
    pub const SLEEP: &str = "sleep";
    pub const REMARK: &str = "remark";
    pub const GETUP_TIME: &str = "getup_time";
    pub const EXERCISE: &str = "exercise";
    pub const SLEEP_TOTAL_TIME: &str = "sleep_total_time";
    pub const TOTAL_EXERCISE_TIME: &str = "total_exercise_time";
    pub const ANAEROBIC_TIME: &str = "anaerobic_time";
    pub const CARDIO_TIME: &str = "cardio_time";
    pub const GROOMING_TIME: &str = "grooming_time";
    pub const STUDY_TIME: &str = "study_time";
    pub const RECREATION_TIME: &str = "recreation_time";
    pub const RECREATION_ZHIHU_TIME: &str = "recreation_zhihu_time";
    pub const RECREATION_BILIBILI_TIME: &str = "recreation_bilibili_time";
    pub const RECREATION_DOUYIN_TIME: &str = "recreation_douyin_time";

    /// Pre-aggregated duration columns in the order they are stored and
    /// reported.
    pub const STAT_COLUMNS: [&str; 10] = [
        SLEEP_TOTAL_TIME,
        TOTAL_EXERCISE_TIME,
        ANAEROBIC_TIME,
        CARDIO_TIME,
        GROOMING_TIME,
        STUDY_TIME,
        RECREATION_TIME,
        RECREATION_ZHIHU_TIME,
        RECREATION_BILIBILI_TIME,
        RECREATION_DOUYIN_TIME,
    ];

    /// Project-path prefix feeding each stat column.
    pub const STAT_COLUMN_PREFIXES: [(&str, &str); 10] = [
        (SLEEP_TOTAL_TIME, "sleep"),
        (TOTAL_EXERCISE_TIME, "exercise"),
        (ANAEROBIC_TIME, "exercise_anaerobic"),
        (CARDIO_TIME, "exercise_cardio"),
        (GROOMING_TIME, "grooming"),
        (STUDY_TIME, "study"),
        (RECREATION_TIME, "recreation"),
        (RECREATION_ZHIHU_TIME, "recreation_zhihu"),
        (RECREATION_BILIBILI_TIME, "recreation_bilibili"),
        (RECREATION_DOUYIN_TIME, "recreation_douyin"),
    ];
}

pub mod projects {
    pub const TABLE: &str = "projects";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const PARENT_ID: &str = "parent_id";

    pub mod cte {
        pub const PROJECT_PATHS: &str = "project_paths";
        pub const PATH: &str = "path";
    }
}

pub mod time_records {
    pub const TABLE: &str = "time_records";
    pub const LOGICAL_ID: &str = "logical_id";
    pub const DATE: &str = "date";
    pub const START: &str = "start";
    pub const END: &str = "end";
    pub const PROJECT_ID: &str = "project_id";
    pub const DURATION: &str = "duration";
    pub const ACTIVITY_REMARK: &str = "activity_remark";
}

pub mod sql_alias {
    pub const TOTAL_DURATION: &str = "total_duration";
}

/// The recursive CTE materializing underscore-joined project paths.
#[must_use]
pub fn project_paths_cte() -> String {
    format!(
        "WITH RECURSIVE {cte}({id}, {path}) AS ( \
           SELECT {id}, {name} FROM {table} p WHERE {parent} IS NULL \
           UNION ALL \
           SELECT p.{id}, pp.{path} || '_' || p.{name} \
           FROM {table} p \
           JOIN {cte} pp ON p.{parent} = pp.{id} \
         )",
        cte = projects::cte::PROJECT_PATHS,
        path = projects::cte::PATH,
        id = projects::ID,
        name = projects::NAME,
        table = projects::TABLE,
        parent = projects::PARENT_ID,
    )
}
