use anyhow::{Context, bail};
use ndarray::Array4;
use teal_anchor_rs::logger;
use teal_anchor_rs::sensor_pipeline::{
    AnchorIngestPipeline,
    CfaPattern,
    ChannelScale,
    PipelineConfig,
    TiffCompression,
    quad_binner_residual,
};

use tracing::{error, info, warn};

/// Forward operator vs. strided reference on a deterministic ramp.
fn binner_self_check() -> anyhow::Result<()> {
    let rgb = Array4::from_shape_fn((1, 3, 16, 16), |(_, c, y, x)| {
        ((c * 7 + y * 16 + x) % 97) as f32 / 97.0
    });
    let scale = ChannelScale([1.0, 0.5, 2.0]);
    for pattern in CfaPattern::ALL {
        let residual = quad_binner_residual(&rgb, pattern, &scale)?;
        if residual > 1e-5 {
            bail!("quad binner disagrees with reference for {pattern}: {residual}");
        }
        info!(%pattern, residual, "Binner self-check passed");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    logger::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        bail!("usage: teal_anchor_rs <capture.raw> <anchor.tiff>");
    };

    info!("Starting teal_anchor...");
    binner_self_check().context("binner self-check failed")?;

    let config = PipelineConfig::builder()
        .compression(TiffCompression::DeflateBalanced)
        .predictor(Some(2))
        .build();
    let pipeline = AnchorIngestPipeline::new(config);
    info!("Compression: {:?}", pipeline.config().export.compression);

    match pipeline.convert_file(&input, &output) {
        Ok(frame) => {
            info!(
                width = frame.width,
                height = frame.height,
                pattern = %frame.pattern,
                "Anchor mosaic written to {output}"
            );
            match frame.white_balance {
                Some(check) if check.within_tolerance => {
                    info!(deviation = ?check.deviation.row(0).to_vec(), "White balance consistent with as-shot neutral");
                }
                Some(check) => {
                    warn!(deviation = ?check.deviation.row(0).to_vec(), "White balance deviates from as-shot neutral");
                }
                None => warn!("Capture has no usable as-shot white balance"),
            }
        }
        Err(e) => {
            error!("Conversion failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
