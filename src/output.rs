// src/output.rs
use crate::error::CbResult;
use crate::pipeline::ModelOutput;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub fn write_price_curve_csv<P: AsRef<Path>>(path: P, output: &ModelOutput) -> CbResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "node,stock_price,value_initial,value_mid,value_maturity")?;
    for (i, s) in output.price_curve.iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{}",
            i, s.stock_price, s.value_at_initial, s.value_at_mid, s.value_at_maturity
        )?;
    }
    file.flush()?;
    Ok(())
}

pub fn write_time_curve_csv<P: AsRef<Path>>(path: P, output: &ModelOutput) -> CbResult<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "layer,time,value_low,value_medium,value_high")?;
    for (j, s) in output.time_curve.iter().enumerate() {
        writeln!(
            file,
            "{},{},{},{},{}",
            j, s.time, s.value_low_regime, s.value_medium_regime, s.value_high_regime
        )?;
    }
    file.flush()?;
    Ok(())
}

pub fn model_output_to_json(output: &ModelOutput) -> CbResult<String> {
    Ok(serde_json::to_string_pretty(output)?)
}

pub fn write_model_output_json<P: AsRef<Path>>(path: P, output: &ModelOutput) -> CbResult<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, output)?;
    Ok(())
}
