/// Fixed payout per list rank. Podium prizes are part of the page markup.
const PRIZE_TABLE: &[(u32, &str)] = &[
    (4, "$350.00"),
    (5, "$200.00"),
    (6, "$150.00"),
    (7, "$100.00"),
    (8, "$50.00"),
    (9, "$50.00"),
    (10, "$50.00"),
];

/// Prize label for a list rank, or `None` when the rank pays nothing.
pub fn prize_for_rank(rank: u32) -> Option<&'static str> {
    PRIZE_TABLE
        .iter()
        .find(|(r, _)| *r == rank)
        .map(|(_, prize)| *prize)
}
