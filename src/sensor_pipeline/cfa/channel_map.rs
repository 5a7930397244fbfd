use ndarray::Array2;

use crate::sensor_pipeline::cfa::types::{CfaPattern, Granularity};

/// Channel index (0 = R, 1 = G, 2 = B) of every pixel of a `height x width` grid.
pub fn channel_index_map(
    height: usize,
    width: usize,
    pattern: CfaPattern,
    granularity: Granularity,
) -> Array2<usize> {
    let shift = granularity.shift();
    Array2::from_shape_fn((height, width), |(y, x)| {
        pattern.color_at(y >> shift, x >> shift).index()
    })
}
