//! Demo catalog used to seed development stores.

use crate::lesson::Lesson;

const DEMO: &[(i64, &str, &str, f64, u32)] = &[
    (1, "Math", "Hendon", 100.0, 5),
    (2, "English", "Colindale", 80.0, 5),
    (3, "Science", "Brent Cross", 90.0, 5),
    (4, "Music", "Golders Green", 70.0, 5),
    (5, "Art", "Hendon", 60.0, 5),
    (6, "History", "Colindale", 75.0, 5),
    (7, "Geography", "Mill Hill", 65.0, 5),
    (8, "Coding", "Brent Cross", 120.0, 5),
    (9, "Drama", "Golders Green", 85.0, 5),
    (10, "Chess", "Mill Hill", 50.0, 5),
];

/// Ten lessons with five spaces each.
pub fn demo_catalog() -> Vec<Lesson> {
    DEMO.iter()
        .map(|&(id, subject, location, price, spaces)| {
            Lesson::new(id, subject, location, price, spaces)
        })
        .collect()
}
