//! Compare command - sampled trajectory error against ground truth.

use std::path::PathBuf;

use staysense::trajectory::{Trajectory, TrajectoryComparator};

use super::common::{read_fixes, InputFormat};
use crate::error::CliError;

/// Arguments for the compare command.
pub struct CompareArgs {
    pub ground_truth: PathBuf,
    pub format: InputFormat,
    pub sampled: PathBuf,
    pub interpolate: bool,
}

/// Run the compare command.
pub fn run(args: CompareArgs) -> Result<(), CliError> {
    let ground_truth = Trajectory::new(read_fixes(&args.ground_truth, args.format)?);
    let sampled = Trajectory::new(read_fixes(&args.sampled, InputFormat::Simple)?);

    let comparator = TrajectoryComparator::new(&ground_truth, &sampled);
    let report = if args.interpolate {
        comparator.compare_interpolated()?
    } else {
        comparator.compare_nearest()?
    };

    println!("Ground truth fixes: {}", ground_truth.len());
    println!("Sampled fixes:      {}", sampled.len());
    println!("Compared fixes:     {}", report.compared_fixes);
    println!("Total error:        {:.1} m", report.distance_sum_m);
    println!("Mean error:         {:.1} m", report.mean_error_m());

    Ok(())
}
