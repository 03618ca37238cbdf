use clap::Parser;

/// Priorities and rankings from pairwise comparisons (Analytic Hierarchy Process).
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the model: the criteria, the alternatives
    /// and where their comparison matrices come from. The format is described in the manual of
    /// ahp_priority.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (list of comma-separated values) The labels of the criteria. Setting this option overrides
    /// the criteria of the --config option.
    #[clap(long, value_parser)]
    pub criteria: Option<String>,

    /// (list of comma-separated values) The labels of the alternatives. If neither this option
    /// nor the configuration provides alternatives, only the criteria weights are computed.
    #[clap(long, value_parser)]
    pub alternatives: Option<String>,

    /// (file path) The comparison matrix of the criteria.
    #[clap(long, value_parser)]
    pub criteria_input: Option<String>,

    /// (file path, repeated) The comparison matrices of the alternatives, one per criterion,
    /// in the order of the criteria.
    #[clap(long, value_parser)]
    pub alternative_input: Option<Vec<String>>,

    /// (csv, xlsx or json) The type of the input files. By default, it is guessed from the
    /// file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. By default the
    /// first worksheet is read.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the computation will be written
    /// in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory) If specified, the matrices, weights, consistency figures and the ranking are
    /// written there as CSV files. Setting this option overrides the outputDirectory of the
    /// configuration.
    #[clap(long, value_parser)]
    pub export_dir: Option<String>,

    /// (file path) A reference file containing a summary in JSON format. If provided, ahpp will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
