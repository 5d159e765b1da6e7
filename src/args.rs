use clap::Parser;

/// Scores the answers of a voter questionnaire against assessed candidates and parties.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The questionnaire session in JSON format: the selections of the voter, the
    /// policy options, the candidates and parties to score and their assessments.
    #[clap(short, long, value_parser)]
    pub input: String,

    /// (file path, optional) The site settings in JSON format (thresholds and colors).
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (integer 0-100, optional) The minimum percentage for the green band. Overrides the value
    /// from the settings file.
    #[clap(long, value_parser)]
    pub green_threshold: Option<u32>,

    /// (integer 0-100, optional) The minimum percentage for the orange band. Overrides the value
    /// from the settings file.
    #[clap(long, value_parser)]
    pub orange_threshold: Option<u32>,

    /// (file path, 'stdout' or empty) Where to write the results in JSON format. Defaults to the
    /// standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected results in JSON format. If provided,
    /// ballotmatch will check that the computed results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
