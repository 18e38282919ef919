use anyhow::{Context, Result};
use clap::Parser;

use std::fs;
use std::path::PathBuf;

use newsreel::article::Article;
use newsreel::audio::NarrationAudio;
use newsreel::content::NoContentService;
use newsreel::fetch::HttpFetcher;
use newsreel::ffmpeg_encoder::FfmpegEncoder;
use newsreel::json_manifest_encoder::JsonManifestEncoder;
use newsreel::logging::init;
use newsreel::newsreel::Newsreel;
use newsreel::opts::RenderOpts;
use newsreel::output_type::OutputType;
use newsreel::resolver::ImageResolver;
use newsreel::video_encoder::VideoEncoder;

fn main() -> Result<()> {
    init();
    let params = get_params()?;

    let narration = fs::read_to_string(&params.script_path).with_context(|| {
        format!(
            "failed to read narration script '{}'",
            params.script_path.display()
        )
    })?;
    let articles = load_articles(&params.articles_path)?;
    let audio = NarrationAudio::from_wav_file(&params.audio_path)?;

    let mut opts = RenderOpts::default();
    opts.use_placeholder_image = params.use_placeholder_image;

    let output = match params.output_type {
        OutputType::Mp4 => compose(
            FfmpegEncoder::new(),
            opts,
            &narration,
            &articles,
            &audio,
            &params.output_path,
        )?,
        OutputType::Manifest => compose(
            JsonManifestEncoder::new(),
            opts,
            &narration,
            &articles,
            &audio,
            &params.output_path,
        )?,
    };

    println!("{}", output.display());
    Ok(())
}

fn compose<E: VideoEncoder>(
    encoder: E,
    opts: RenderOpts,
    narration: &str,
    articles: &[Article],
    audio: &NarrationAudio,
    output_path: &PathBuf,
) -> Result<PathBuf> {
    let resolver = ImageResolver::new(NoContentService, HttpFetcher::new()?)
        .use_placeholder(opts.use_placeholder_image);
    let newsreel = Newsreel::with_parts(encoder, resolver, opts);
    Ok(newsreel.compose_video(narration, articles, audio, output_path)?)
}

fn load_articles(path: &PathBuf) -> Result<Vec<Article>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read articles file '{}'", path.display()))?;
    let articles: Vec<Article> = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse articles JSON '{}'", path.display()))?;
    Ok(articles)
}

#[derive(Parser, Debug)]
#[command(name = "newsreel")]
#[command(about = "Composes a narrated news video from articles, a script, and audio")]
struct Params {
    #[arg(short = 'a', long = "articles")]
    pub articles_path: PathBuf,

    #[arg(short = 's', long = "script")]
    pub script_path: PathBuf,

    #[arg(short = 'n', long = "narration-audio")]
    pub audio_path: PathBuf,

    #[arg(short = 'o', long = "output", default_value = "output/news_video.mp4")]
    pub output_path: PathBuf,

    #[arg(
        short = 't',
        long = "output-type",
        value_enum,
        default_value_t = OutputType::Mp4
    )]
    pub output_type: OutputType,

    #[arg(long = "placeholder-image", default_value_t = false)]
    pub use_placeholder_image: bool,
}

fn get_params() -> Result<Params> {
    Ok(Params::parse())
}
