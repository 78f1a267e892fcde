//! Plain-text `Key: value` input files
//!
//! ```text
//! Num Blocks: 12
//! Num Rows: 3
//! Num Block Yards: 5
//! Num Block Ground: 4
//! Num Block River: 3
//! Num houses of each Block Yard: 20
//! Num trees of each Block Ground: 40
//! The time (0-24) to view Thermal Map: 14
//! ```
//!
//! Lines without a colon and unknown keys are ignored. `Seed` and `Name` are
//! accepted as optional extras.

use thiserror::Error;

use crate::map::BlockDistribution;
use crate::scenario::{Scenario, Timeline, DEFAULT_SEED};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("scenario parse error: {0}")]
    Parse(String),
    #[error("scenario validation error: {0}")]
    Validation(String),
}

pub fn parse_input(text: &str) -> Result<Scenario, ScenarioError> {
    Parser::new(text).parse()
}

struct Parser<'a> {
    lines: Vec<&'a str>,
    index: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let lines = text.lines().collect();
        Self { lines, index: 0 }
    }

    fn parse(&mut self) -> Result<Scenario, ScenarioError> {
        let mut name = "input".to_string();
        let mut seed = DEFAULT_SEED;
        let mut num_blocks = None;
        let mut rows = None;
        let mut yards = None;
        let mut grounds = None;
        let mut rivers = None;
        let mut houses = None;
        let mut trees = None;
        let mut hour = None;

        while let Some(line) = self.next_line() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "Name" => name = value.trim().to_string(),
                "Seed" => seed = parse_u64(value)?,
                "Num Blocks" => num_blocks = Some(parse_usize(value)?),
                "Num Rows" => rows = Some(parse_usize(value)?),
                "Num Block Yards" => yards = Some(parse_usize(value)?),
                "Num Block Ground" => grounds = Some(parse_usize(value)?),
                "Num Block River" => rivers = Some(parse_usize(value)?),
                "Num houses of each Block Yard" => houses = Some(parse_usize(value)?),
                "Num trees of each Block Ground" => trees = Some(parse_usize(value)?),
                "The time (0-24) to view Thermal Map" => hour = Some(parse_f64(value)?),
                _ => {}
            }
        }

        let scenario = Scenario {
            name,
            description: None,
            seed,
            num_blocks: required(num_blocks, "Num Blocks")?,
            rows: required(rows, "Num Rows")?,
            block_size: None,
            distribution: BlockDistribution {
                yards: required(yards, "Num Block Yards")?,
                grounds: required(grounds, "Num Block Ground")?,
                rivers: required(rivers, "Num Block River")?,
            },
            houses: required(houses, "Num houses of each Block Yard")?,
            trees: required(trees, "Num trees of each Block Ground")?,
            hour: required(hour, "The time (0-24) to view Thermal Map")?,
            timeline: Timeline::default(),
            snapshot_interval_frames: 0,
            log_level: crate::scenario::default_log_level(),
        };
        scenario.validate()?;
        Ok(scenario)
    }

    fn next_line(&mut self) -> Option<&'a str> {
        if self.index >= self.lines.len() {
            None
        } else {
            let line = self.lines[self.index];
            self.index += 1;
            Some(line)
        }
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, ScenarioError> {
    value.ok_or_else(|| ScenarioError::Parse(format!("missing '{key}'")))
}

fn parse_usize(value: &str) -> Result<usize, ScenarioError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ScenarioError::Parse(format!("unable to parse integer from '{}'", value.trim())))
}

fn parse_u64(value: &str) -> Result<u64, ScenarioError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ScenarioError::Parse(format!("unable to parse integer from '{}'", value.trim())))
}

fn parse_f64(value: &str) -> Result<f64, ScenarioError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ScenarioError::Parse(format!("unable to parse number from '{}'", value.trim())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "\
Num Blocks: 12
Num Rows: 3
Num Block Yards: 5
Num Block Ground: 4
Num Block River: 3
Num houses of each Block Yard: 20
Num trees of each Block Ground: 40
The time (0-24) to view Thermal Map: 14
";

    #[test]
    fn parses_original_input_format() {
        let scenario = parse_input(INPUT).unwrap();
        assert_eq!(scenario.num_blocks, 12);
        assert_eq!(scenario.rows, 3);
        assert_eq!(scenario.shape().cols, 4);
        assert_eq!(scenario.distribution.rivers, 3);
        assert_eq!(scenario.houses, 20);
        assert_eq!(scenario.trees, 40);
        assert_eq!(scenario.hour, 14.0);
        assert_eq!(scenario.seed, DEFAULT_SEED);
    }

    #[test]
    fn ignores_noise_and_unknown_keys() {
        let text = format!("# city input\n\nSeed: 99\nColor scheme: dark\n{INPUT}");
        let scenario = parse_input(&text).unwrap();
        assert_eq!(scenario.seed, 99);
    }

    #[test]
    fn missing_key_is_a_parse_error() {
        let text = INPUT.replace("Num Rows: 3\n", "");
        let err = parse_input(&text).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(msg) if msg.contains("Num Rows")));
    }

    #[test]
    fn bad_number_is_a_parse_error() {
        let text = INPUT.replace("Num Blocks: 12", "Num Blocks: twelve");
        assert!(matches!(
            parse_input(&text),
            Err(ScenarioError::Parse(_))
        ));
    }

    #[test]
    fn indivisible_rows_fail_validation() {
        let text = INPUT.replace("Num Rows: 3", "Num Rows: 5");
        assert!(matches!(
            parse_input(&text),
            Err(ScenarioError::Validation(_))
        ));
    }
}
