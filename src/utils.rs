use std::time::Instant;

///
/// measure time in nano-seconds (ns) of closure.
///
pub fn timer<F, T>(f: F) -> (T, u128)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let ret = f();
    let duration = start.elapsed();
    (ret, duration.as_nanos())
}

///
/// Sum of each row of a `n_rows x n_cols` table.
/// `get(row, col)` hides the storage layout of the table.
///
pub fn row_sums<F>(n_rows: usize, n_cols: usize, get: F) -> Vec<f64>
where
    F: Fn(usize, usize) -> f64,
{
    (0..n_rows)
        .map(|row| (0..n_cols).map(|col| get(row, col)).sum())
        .collect()
}

///
/// Is `|x - 1| < tolerance`?
///
pub fn is_unit(x: f64, tolerance: f64) -> bool {
    1.0 - tolerance < x && x < 1.0 + tolerance
}
