use clap::Parser;

/// Default map center: Belo Horizonte city hall area.
pub const DEFAULT_CENTER: (f64, f64) = (-19.9227, -43.9451);

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Mobility Dashboard - a desktop dashboard for municipal traffic and mobility datasets
pub struct Settings {
    /// Base URL of the mobility backend
    #[clap(long, default_value = "http://localhost:5000")]
    pub api_url: String,

    /// Dataset slug selected on startup
    #[clap(long, default_value = "estacionamento_publico_pessoa_idosa")]
    pub dataset: String,

    /// Heatmap category slug selected on startup
    #[clap(long, default_value = "speed-reducer")]
    pub heatmap: String,

    /// Route line width in pixels
    #[clap(long, default_value = "4.0")]
    pub route_line_width: f32,

    /// Initial map zoom level
    #[clap(long, default_value = "12.0")]
    pub zoom: f64,
}

impl Settings {
    pub fn from_cli() -> Self {
        Settings::parse()
    }
}
