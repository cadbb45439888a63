/// Time a block and report the elapsed duration through the `perf` log scope.
/// Evaluates to the value of the block.
#[macro_export]
macro_rules! profile {
    ($description:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        $crate::scoped_log!(info, "perf", "[{}]: Time elapsed: {:?}", $description, duration);
        result
    }};
}
