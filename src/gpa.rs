use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single graded course as submitted on the performance form.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct CourseEntry {
    pub course_name: String,
    pub course_code: String,
    pub credit_hours: u32,
    pub grade: String,
    #[serde(default)]
    pub attendance: Option<String>,
}

/// One performance-form submission: a semester label, the CGPA computed at
/// insert time, and the courses exactly as entered. Duplicate submissions
/// under the same label are stored as separate records; the dashboard
/// aggregator folds them together.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SemesterRecord {
    pub semester: String,
    pub cgpa: f64,
    pub courses: Vec<CourseEntry>,
}

/// Looks up the point value for a letter grade.
///
/// The table is fixed and case-sensitive. Any grade outside it (including
/// blank input) is treated as invalid and excluded from weighted averages,
/// although the course entry itself is still stored.
pub fn grade_points(grade: &str) -> Option<u32> {
    match grade {
        "O" => Some(10),
        "A+" => Some(9),
        "A" => Some(8),
        "B+" => Some(7),
        "B" => Some(6),
        "C" => Some(5),
        _ => None,
    }
}

/// Computes the credit-weighted CGPA for one semester submission.
///
/// Courses with invalid grades contribute neither points nor credits. Returns
/// 0.0 when no validly graded credits remain. No rounding is applied here;
/// the stored value keeps full precision and the dashboard rounds for display.
pub fn semester_cgpa(courses: &[CourseEntry]) -> f64 {
    let mut total_points: u64 = 0;
    let mut total_credits: u64 = 0;

    for course in courses {
        if let Some(points) = grade_points(&course.grade) {
            total_points += points as u64 * course.credit_hours as u64;
            total_credits += course.credit_hours as u64;
        }
    }

    if total_credits == 0 {
        return 0.0;
    }
    total_points as f64 / total_credits as f64
}

/// Per-semester CGPA summary for the dashboard.
///
/// `labels` and `values` are parallel vectors in first-seen order of the
/// semester labels, ready to inject into the dashboard chart.
#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct SemesterSummary {
    pub by_label: HashMap<String, f64>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Aggregates all of a user's semester records into one CGPA per label.
///
/// Records sharing a label are combined: credit hours accumulate across every
/// course in every record under that label, while points are re-derived from
/// the stored grade and invalid grades contribute 0. Unlike the insert-time
/// [`semester_cgpa`], an invalid grade therefore pulls the display-time
/// average down rather than being skipped. The cgpa stored on each record at
/// insert time is ignored. Final values are rounded to two decimals, or 0
/// when a label has no credits at all.
pub fn aggregate_semesters(records: &[SemesterRecord]) -> SemesterSummary {
    let mut labels: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (u64, u64)> = HashMap::new(); // (credits, points)

    for record in records {
        if !totals.contains_key(&record.semester) {
            labels.push(record.semester.clone());
        }
        let entry = totals.entry(record.semester.clone()).or_insert((0, 0));
        for course in &record.courses {
            entry.0 += course.credit_hours as u64;
            if let Some(points) = grade_points(&course.grade) {
                entry.1 += points as u64 * course.credit_hours as u64;
            }
        }
    }

    let mut summary = SemesterSummary::default();
    for label in labels {
        let (credits, points) = totals[&label];
        let cgpa = if credits > 0 {
            round2(points as f64 / credits as f64)
        } else {
            0.0
        };
        summary.by_label.insert(label.clone(), cgpa);
        summary.labels.push(label);
        summary.values.push(cgpa);
    }
    summary
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(grade: &str, credits: u32) -> CourseEntry {
        CourseEntry {
            course_name: "Course".to_string(),
            course_code: "C100".to_string(),
            credit_hours: credits,
            grade: grade.to_string(),
            attendance: None,
        }
    }

    fn record(semester: &str, courses: Vec<CourseEntry>) -> SemesterRecord {
        let cgpa = semester_cgpa(&courses);
        SemesterRecord {
            semester: semester.to_string(),
            cgpa,
            courses,
        }
    }

    #[test]
    fn grade_table_is_fixed_and_case_sensitive() {
        assert_eq!(grade_points("O"), Some(10));
        assert_eq!(grade_points("A+"), Some(9));
        assert_eq!(grade_points("A"), Some(8));
        assert_eq!(grade_points("B+"), Some(7));
        assert_eq!(grade_points("B"), Some(6));
        assert_eq!(grade_points("C"), Some(5));
        assert_eq!(grade_points("o"), None);
        assert_eq!(grade_points("F"), None);
        assert_eq!(grade_points(""), None);
    }

    #[test]
    fn weighted_average_matches_hand_computation() {
        // (10*4 + 8*3) / 7 = 68/7
        let courses = vec![course("O", 4), course("A", 3)];
        let cgpa = semester_cgpa(&courses);
        assert!((cgpa - 68.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_grades_yield_zero_cgpa() {
        let courses = vec![course("F", 3)];
        assert_eq!(semester_cgpa(&courses), 0.0);
        assert_eq!(semester_cgpa(&[]), 0.0);
    }

    #[test]
    fn invalid_grades_are_excluded_not_averaged_in() {
        // The F row must not drag the average down via its credits.
        let courses = vec![course("O", 4), course("F", 3)];
        assert!((semester_cgpa(&courses) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn cgpa_stays_in_grade_scale_range() {
        let courses = vec![course("O", 1), course("C", 9), course("B+", 2)];
        let cgpa = semester_cgpa(&courses);
        assert!(cgpa >= 0.0 && cgpa <= 10.0);
    }

    #[test]
    fn aggregation_rounds_to_two_decimals() {
        let records = vec![record("Fall2024", vec![course("O", 4), course("A", 3)])];
        let summary = aggregate_semesters(&records);
        // 68/7 = 9.714285... rounds to 9.71
        assert_eq!(summary.by_label["Fall2024"], 9.71);
    }

    #[test]
    fn duplicate_labels_fold_into_one_group() {
        let records = vec![
            record("Fall2024", vec![course("O", 4)]),
            record("Spring2025", vec![course("B", 3)]),
            record("Fall2024", vec![course("C", 4)]),
        ];
        let summary = aggregate_semesters(&records);
        assert_eq!(summary.labels, vec!["Fall2024", "Spring2025"]);
        // (10*4 + 5*4) / 8 = 7.5 across both Fall2024 records
        assert_eq!(summary.by_label["Fall2024"], 7.5);
        assert_eq!(summary.by_label["Spring2025"], 6.0);
        assert_eq!(summary.values, vec![7.5, 6.0]);
    }

    #[test]
    fn aggregator_counts_credits_of_invalid_grades() {
        // Display-time math counts every course's credits in the denominator:
        // (10*4 + 0*3) / (4+3) = 40/7 = 5.714... -> 5.71
        let records = vec![record("Fall2024", vec![course("O", 4), course("F", 3)])];
        let summary = aggregate_semesters(&records);
        assert_eq!(summary.by_label["Fall2024"], 5.71);
    }

    #[test]
    fn label_with_no_valid_grades_reports_zero() {
        let records = vec![record("Fall2024", vec![course("F", 3), course("", 2)])];
        let summary = aggregate_semesters(&records);
        assert_eq!(summary.by_label["Fall2024"], 0.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let records = vec![
            record("Fall2024", vec![course("O", 4), course("A", 3)]),
            record("Spring2025", vec![course("B+", 5)]),
        ];
        let first = aggregate_semesters(&records);
        let second = aggregate_semesters(&records);
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.values, second.values);
        assert_eq!(first.by_label, second.by_label);
    }

    #[test]
    fn stored_cgpa_is_ignored_by_the_aggregator() {
        let mut rec = record("Fall2024", vec![course("A", 3)]);
        rec.cgpa = 1.0; // deliberately wrong
        let summary = aggregate_semesters(&[rec]);
        assert_eq!(summary.by_label["Fall2024"], 8.0);
    }
}
