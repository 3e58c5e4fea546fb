//! # fast-transcode CLI
//!
//! Command-line front end for the transcoding engine: converts files between
//! encodings, guesses the encoding of unknown input, validates input against
//! an encoding and describes the supported encodings.

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use log::LevelFilter;
#[cfg(feature = "cli")]
use serde::Serialize;

#[cfg(feature = "cli")]
use fast_transcode::detection::{DetectionResult, EncodingDetector};
#[cfg(feature = "cli")]
use fast_transcode::{
    BestFitFallback, Codec, Encoding, Error as TranscodeError, PassThroughFallback,
    ReplacementFallback, TranscodingWriter,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// fast-transcode: convert text between ASCII, Latin-1 and the Unicode encodings
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "fast-transcode")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert files between character encodings
    Convert(ConvertArgs),

    /// Detect encoding of input files
    Detect(DetectArgs),

    /// List all supported encodings
    List(ListArgs),

    /// Validate that a file is properly encoded
    Validate(ValidateArgs),

    /// Display detailed information about an encoding
    Info(InfoArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Source encoding (name, alias or code page)
    #[arg(short = 'f', long = "from", value_parser = parse_encoding)]
    from: Encoding,

    /// Target encoding (name, alias or code page)
    #[arg(short = 't', long = "to", value_parser = parse_encoding)]
    to: Encoding,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Convert in-place (overwrite input file)
    #[arg(long, conflicts_with = "output")]
    in_place: bool,

    /// How to handle malformed input and unencodable characters
    #[arg(long, value_enum, default_value = "replace")]
    fallback: FallbackMode,

    /// Replacement text for the replace fallback (default: ? or U+FFFD per encoding)
    #[arg(long)]
    replacement: Option<String>,

    /// Strip BOM from input
    #[arg(long)]
    strip_bom: bool,

    /// Add BOM to output
    #[arg(long)]
    add_bom: bool,

    /// Write UTF-7 optional direct characters (!"#$%&*;<=>@[]^_`{|}) unencoded
    #[arg(long)]
    utf7_optionals: bool,

    /// Chunk size fed to the converter (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct DetectArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Show confidence scores
    #[arg(long)]
    confidence: bool,

    /// Maximum bytes to read for detection
    #[arg(long, default_value = "8192")]
    sample_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Filter by category (unicode, legacy)
    #[arg(short, long)]
    category: Option<String>,

    /// Show only ASCII-compatible encodings
    #[arg(long)]
    ascii_compatible: bool,

    /// Show only single-byte encodings
    #[arg(long)]
    single_byte: bool,

    /// Show encoding details
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ValidateArgs {
    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Expected encoding
    #[arg(short, long, value_parser = parse_encoding)]
    encoding: Encoding,

    /// Show position of first error
    #[arg(long)]
    show_errors: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    #[arg(value_parser = parse_encoding)]
    encoding: Encoding,

    /// Show how sample characters are encoded
    #[arg(long)]
    samples: bool,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Clone, Copy, Debug, ValueEnum)]
enum FallbackMode {
    /// Substitute a replacement string
    Replace,
    /// Fail on the first problem
    Exception,
    /// Map accented and full-width characters to ASCII look-alikes (encoding side)
    BestFit,
    /// Widen undecodable bytes to the code unit of the same value (decoding side)
    PassThrough,
}

/// Accepts a registered name or alias, or a numeric code page
#[cfg(feature = "cli")]
fn parse_encoding(s: &str) -> Result<Encoding> {
    let encoding = match s.trim().parse::<u32>() {
        Ok(code_page) => Encoding::from_code_page(code_page)?,
        Err(_) => s.parse::<Encoding>()?,
    };
    Ok(encoding)
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    from: Encoding,
    to: Encoding,
    bytes_processed: usize,
    bytes_written: usize,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct DetectionReport<'a> {
    #[serde(flatten)]
    result: &'a DetectionResult,
    sample_size: usize,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Detect(ref args) => detect_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
        Commands::Validate(ref args) => validate_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn setup_logging(verbose: bool) -> Result<()> {
    let level_filter = match std::env::var("FAST_TRANSCODE_LOG").as_deref() {
        Ok("trace") => LevelFilter::Trace,
        Ok("debug") => LevelFilter::Debug,
        Ok("info") => LevelFilter::Info,
        Ok("warn") => LevelFilter::Warn,
        Ok("error") => LevelFilter::Error,
        _ if verbose => LevelFilter::Debug,
        _ => LevelFilter::Warn,
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter)
        .chain(io::stderr())
        .apply()
        .context("Failed to install logger")
}

#[cfg(feature = "cli")]
fn read_input(input: Option<&PathBuf>) -> Result<Vec<u8>> {
    match input {
        Some(input_path) => {
            log::debug!("Reading from: {}", input_path.display());
            fs::read(input_path)
                .with_context(|| format!("Failed to read input file: {}", input_path.display()))
        }
        None => {
            log::debug!("Reading from stdin");
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn build_codecs(args: &ConvertArgs) -> Result<(Codec, Codec)> {
    let mut source = Codec::builder(args.from);
    let mut target = Codec::builder(args.to)
        .emit_preamble(args.add_bom)
        .allow_optionals(args.utf7_optionals);

    match args.fallback {
        FallbackMode::Replace => {
            if let Some(ref text) = args.replacement {
                let replacement = ReplacementFallback::new(text)
                    .with_context(|| format!("Invalid replacement text: {text:?}"))?;
                source = source.decoder_fallback(replacement.clone());
                target = target.encoder_fallback(replacement);
            }
        }
        FallbackMode::Exception => {
            source = source.strict();
            target = target.strict();
        }
        FallbackMode::BestFit => target = target.encoder_fallback(BestFitFallback),
        FallbackMode::PassThrough => source = source.decoder_fallback(PassThroughFallback),
    }

    Ok((source.build(), target.build()))
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();

    log::debug!(
        "Converting from {} to {}",
        args.from.name(),
        args.to.name()
    );

    let (source, target) = build_codecs(args)?;
    let input_data = read_input(args.input.as_ref())?;

    let mut body = input_data.as_slice();
    if args.strip_bom {
        if let Some(bom) = args.from.bom() {
            if let Some(rest) = body.strip_prefix(bom) {
                body = rest;
                log::debug!("Stripped BOM ({} bytes)", bom.len());
            }
        }
    }

    let chunk_size = args.buffer_size.max(1) * 1024;
    let mut writer = TranscodingWriter::new(target.preamble().to_vec(), &source, &target);
    for chunk in body.chunks(chunk_size) {
        writer.write_all(chunk).context("Conversion failed")?;
    }
    let final_data = writer.finish().context("Conversion failed")?;

    if args.in_place {
        let Some(ref input_path) = args.input else {
            anyhow::bail!("Cannot use --in-place without input file");
        };
        fs::write(input_path, &final_data).with_context(|| {
            format!("Failed to write to input file: {}", input_path.display())
        })?;
        log::debug!("Updated file in-place: {}", input_path.display());
    } else if let Some(ref output_path) = args.output {
        fs::write(output_path, &final_data)
            .with_context(|| format!("Failed to write output file: {}", output_path.display()))?;
        log::debug!("Wrote to: {}", output_path.display());
    } else {
        io::stdout()
            .write_all(&final_data)
            .context("Failed to write to stdout")?;
    }

    let processing_time = start_time.elapsed();
    log::debug!(
        "Processed {} bytes -> {} bytes in {:?}",
        body.len(),
        final_data.len(),
        processing_time
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                from: args.from,
                to: args.to,
                bytes_processed: body.len(),
                bytes_written: final_data.len(),
                processing_time_ms: u64::try_from(processing_time.as_millis()).unwrap_or(u64::MAX),
            };
            // stdout may carry the converted data, so the report goes to stderr
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() || args.in_place {
                eprintln!("✓ Conversion completed successfully");
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn detect_command(args: &DetectArgs, cli: &Cli) -> Result<()> {
    let limit = u64::try_from(args.sample_size).unwrap_or(u64::MAX);
    let mut sample_data = Vec::new();
    if let Some(ref input_path) = args.input {
        let file = fs::File::open(input_path)
            .with_context(|| format!("Failed to open input file: {}", input_path.display()))?;
        file.take(limit)
            .read_to_end(&mut sample_data)
            .with_context(|| format!("Failed to read input file: {}", input_path.display()))?;
    } else {
        io::stdin()
            .take(limit)
            .read_to_end(&mut sample_data)
            .context("Failed to read from stdin")?;
    }

    let detector = EncodingDetector::with_sample_size(args.sample_size);
    let detection_result = detector.detect(&sample_data);

    match cli.format {
        OutputFormat::Json => {
            let report = DetectionReport {
                result: &detection_result,
                sample_size: sample_data.len(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Detected encoding: {}", detection_result.encoding.name());
            println!("Confidence: {:.1}%", detection_result.confidence * 100.0);

            if detection_result.bom_detected {
                println!("BOM detected: Yes ({} bytes)", detection_result.bom_len);
            }

            println!("Sample size: {} bytes", sample_data.len());

            if args.confidence && detection_result.candidates.len() > 1 {
                println!("\nAll candidates:");
                for (encoding, confidence) in &detection_result.candidates {
                    println!("  {}: {:.1}%", encoding.name(), confidence * 100.0);
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn category(encoding: Encoding) -> &'static str {
    if encoding.is_single_byte() {
        "legacy"
    } else {
        "unicode"
    }
}

#[cfg(feature = "cli")]
fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    let filtered_encodings: Vec<Encoding> = Encoding::all()
        .iter()
        .copied()
        .filter(|&encoding| {
            if let Some(ref filter_cat) = args.category {
                if !category(encoding).eq_ignore_ascii_case(filter_cat) {
                    return false;
                }
            }

            if args.ascii_compatible && !encoding.is_ascii_compatible() {
                return false;
            }

            if args.single_byte && !encoding.is_single_byte() {
                return false;
            }

            true
        })
        .collect();

    match cli.format {
        OutputFormat::Json => {
            let encodings_info: Vec<_> = filtered_encodings
                .iter()
                .map(|&encoding| {
                    serde_json::json!({
                        "name": encoding.name(),
                        "web_name": encoding.web_name(),
                        "code_page": encoding.code_page(),
                        "category": category(encoding),
                        "description": get_encoding_description(encoding),
                        "ascii_compatible": encoding.is_ascii_compatible(),
                        "single_byte": encoding.is_single_byte(),
                        "has_bom": encoding.bom().is_some()
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&encodings_info)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", filtered_encodings.len());
            println!();

            for encoding in filtered_encodings {
                println!(
                    "{:12} {:6} {:10} {}",
                    encoding.name(),
                    encoding.code_page(),
                    format!("[{}]", category(encoding)),
                    get_encoding_description(encoding)
                );

                if args.details {
                    println!("                Web name: {}", encoding.web_name());
                    println!(
                        "                ASCII Compatible: {}",
                        yes_no(encoding.is_ascii_compatible())
                    );
                    println!(
                        "                Single-byte: {}",
                        yes_no(encoding.is_single_byte())
                    );
                    if let Some(bom) = encoding.bom() {
                        println!("                BOM: {:02X?}", bom);
                    }
                    println!();
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn validate_command(args: &ValidateArgs, cli: &Cli) -> Result<()> {
    let encoding = args.encoding;
    let input_data = read_input(args.input.as_ref())?;

    let strict = Codec::builder(encoding).strict().build();
    let outcome = strict.char_count(&input_data);

    if let OutputFormat::Json = cli.format {
        let report = match &outcome {
            Ok(chars) => serde_json::json!({
                "encoding": encoding,
                "valid": true,
                "chars": chars,
            }),
            Err(TranscodeError::InvalidCharacterSequence { sequence, index }) => {
                serde_json::json!({
                    "encoding": encoding,
                    "valid": false,
                    "index": index,
                    "sequence": sequence.to_string(),
                })
            }
            Err(e) => serde_json::json!({
                "encoding": encoding,
                "valid": false,
                "error": e.to_string(),
            }),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        std::process::exit(if outcome.is_ok() { 0 } else { 1 });
    }

    match outcome {
        Ok(_) => {
            println!("✓ File is valid {}", encoding.name());
            std::process::exit(0);
        }
        Err(e) => {
            println!("✗ File is not valid {}", encoding.name());

            if args.show_errors {
                match e {
                    TranscodeError::InvalidCharacterSequence { sequence, index } => {
                        println!("  Error at position {}: invalid sequence {}", index, sequence);
                    }
                    _ => println!("  Error: {}", e),
                }
            }

            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let encoding = args.encoding;
    let codec = encoding.codec();
    let max_bytes_per_char = codec
        .max_byte_count(1)
        .context("Failed to compute worst-case size")?;

    match cli.format {
        OutputFormat::Json => {
            let samples: Vec<_> = if args.samples {
                character_samples(codec)
                    .into_iter()
                    .map(|(text, bytes)| serde_json::json!({ "char": text, "bytes": bytes }))
                    .collect()
            } else {
                Vec::new()
            };
            let info = serde_json::json!({
                "name": encoding.name(),
                "web_name": encoding.web_name(),
                "code_page": encoding.code_page(),
                "ascii_compatible": encoding.is_ascii_compatible(),
                "single_byte": encoding.is_single_byte(),
                "max_bytes_per_char": max_bytes_per_char,
                "bom": encoding.bom().map(|b| format!("{:02X?}", b)),
                "description": get_encoding_description(encoding),
                "samples": samples,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", encoding.name());
            println!("Description: {}", get_encoding_description(encoding));
            println!("Web name: {}", encoding.web_name());
            println!("Code page: {}", encoding.code_page());
            println!(
                "ASCII Compatible: {}",
                yes_no(encoding.is_ascii_compatible())
            );
            println!("Single-byte: {}", yes_no(encoding.is_single_byte()));
            println!("Worst-case bytes per char: {}", max_bytes_per_char);

            if let Some(bom) = encoding.bom() {
                println!("BOM: {:02X?}", bom);
            } else {
                println!("BOM: None");
            }

            if args.samples {
                println!("\nCharacter Samples:");
                for (text, bytes) in character_samples(codec) {
                    println!("  {} -> {:02X?}", text, bytes);
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn get_encoding_description(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::ASCII => "American Standard Code for Information Interchange (7-bit)",
        Encoding::ISO_8859_1 => "Latin alphabet No. 1, Western European",
        Encoding::UTF7 => "Unicode Transformation Format 7-bit, mail-safe (RFC 2152)",
        Encoding::UTF8 => "Unicode Transformation Format 8-bit, variable-length encoding",
        Encoding::UTF16LE => "Unicode Transformation Format 16-bit, little-endian",
        Encoding::UTF16BE => "Unicode Transformation Format 16-bit, big-endian",
        Encoding::UTF32LE => "Unicode Transformation Format 32-bit, little-endian",
        Encoding::UTF32BE => "Unicode Transformation Format 32-bit, big-endian",
    }
}

/// Encodes a fixed set of characters with the shared default codec
#[cfg(feature = "cli")]
fn character_samples(codec: &Codec) -> Vec<(&'static str, Vec<u8>)> {
    ["A", "+", "\u{e9}", "\u{20ac}", "\u{1F600}"]
        .into_iter()
        .filter_map(|text| codec.encode_str(text).ok().map(|bytes| (text, bytes)))
        .collect()
}
