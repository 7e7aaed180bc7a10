#![forbid(unsafe_code)]

//! Ljustero CLI: enveloped XML-DSig and XAdES signing and verification.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ljustero_core::Error;
use ljustero_dsig::{DsigContext, KeyInfoMode, SignerConfig, XmlDsigSigner};
use ljustero_keys::FixedKeySelector;
use ljustero_crypto::DigestMethod;
use ljustero_xades::{QualifyingProperties, SignaturePolicy, XadesSigner};
use ljustero_xml::XmlDocument;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ljustero",
    about = "Ljustero: enveloped XML-DSig and XAdES signatures",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an XML document with an enveloped signature
    Sign {
        /// Input XML file
        file: PathBuf,

        /// Private key (PEM or DER, PKCS#8 or PKCS#1)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Signer certificate (PEM or DER)
        #[arg(long)]
        cert: PathBuf,

        /// Add XAdES qualifying properties
        #[arg(long)]
        xades: bool,

        /// Put the raw public key in KeyInfo instead of the certificate
        #[arg(long = "key-value")]
        key_value: bool,

        /// Fixed XAdES SigningTime (RFC 3339)
        #[arg(long = "signing-time", value_parser = parse_time)]
        signing_time: Option<DateTime<Utc>>,

        /// Explicit XAdES signature policy identifier
        #[arg(long = "policy-id", requires = "policy_file")]
        policy_id: Option<String>,

        /// Policy document hashed into SigPolicyHash
        #[arg(long = "policy-file", requires = "policy_id")]
        policy_file: Option<PathBuf>,

        /// Digest algorithm URI
        #[arg(long = "digest-method")]
        digest_method: Option<String>,

        /// Signature algorithm URI
        #[arg(long = "signature-method")]
        signature_method: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Verify a signed XML document
    Verify {
        /// Input XML file
        file: PathBuf,

        /// Verify against this certificate instead of the document's KeyInfo
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Register additional ID attribute names
        #[arg(long = "id-attr")]
        id_attr: Vec<String>,

        /// Resolve reference ids on any element, not only XAdES properties
        #[arg(long = "id-any-element")]
        id_any_element: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List supported algorithms
    Info,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sign {
            file,
            key,
            cert,
            xades,
            key_value,
            signing_time,
            policy_id,
            policy_file,
            digest_method,
            signature_method,
            output,
            id_attr,
            verbose,
        } => {
            init_logging(verbose);
            let opts = SignOptions {
                xades,
                key_value,
                signing_time,
                policy: policy_id.zip(policy_file),
                digest_method,
                signature_method,
            };
            cmd_sign(&file, &key, &cert, opts, output, &id_attr)
        }

        Commands::Verify {
            file,
            cert,
            id_attr,
            id_any_element,
            verbose,
        } => {
            init_logging(verbose);
            let mut ctx = context(&id_attr);
            if id_any_element {
                ctx = ctx.index_all_elements();
            }
            cmd_verify(&file, cert, ctx, verbose)
        }

        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_time(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time {s:?}: {e}"))
}

struct SignOptions {
    xades: bool,
    key_value: bool,
    signing_time: Option<DateTime<Utc>>,
    /// Policy identifier and the file holding the policy document.
    policy: Option<(String, PathBuf)>,
    digest_method: Option<String>,
    signature_method: Option<String>,
}

fn cmd_sign(
    file: &Path,
    key: &Path,
    cert: &Path,
    opts: SignOptions,
    output: Option<PathBuf>,
    id_attr: &[String],
) -> Result<(), Error> {
    let mut doc = XmlDocument::parse_bytes(&std::fs::read(file)?)?;
    let key = ljustero_keys::loader::load_signing_key(key, cert)?;

    let mut config = SignerConfig::default();
    if opts.key_value {
        config.key_info = KeyInfoMode::KeyValue;
    }
    if let Some(uri) = opts.digest_method {
        config.digest_method = uri;
    }
    if let Some(uri) = opts.signature_method {
        config.signature_method = uri;
    }

    if opts.xades {
        let mut signer = XadesSigner::new(key)
            .with_config(config)
            .with_context(context(id_attr));
        if let Some(time) = opts.signing_time {
            signer = signer.with_signing_time(time);
        }
        if let Some((id, path)) = opts.policy {
            let method = DigestMethod::from_uri(&signer.config().digest_method)?;
            let policy = SignaturePolicy::explicit(&id, method, &std::fs::read(path)?);
            signer = signer.with_signature_policy(policy);
        }
        signer.sign_enveloped(&mut doc)?;
    } else {
        XmlDsigSigner::new(key)
            .with_config(config)
            .with_context(context(id_attr))
            .sign_enveloped(&mut doc)?;
    }
    tracing::info!(file = %file.display(), xades = opts.xades, "signed");
    write_output(output, doc.to_xml().as_bytes())
}

fn cmd_verify(file: &Path, cert: Option<PathBuf>, mut ctx: DsigContext, verbose: bool) -> Result<(), Error> {
    let doc = XmlDocument::parse_bytes(&std::fs::read(file)?)?;
    if let Some(path) = cert {
        let cert = ljustero_keys::loader::load_cert_file(&path)?;
        ctx = ctx.with_key_selector(FixedKeySelector(cert.public_key().clone()));
    }

    let result = ljustero_dsig::verify(&ctx, &doc)?;
    if verbose {
        eprintln!("{}", result.diagnostics());
        if let Ok(props) = QualifyingProperties::find(&doc) {
            eprintln!("signing time: {}", props.signing_time.to_rfc3339());
            eprintln!("signer: {} #{}", props.issuer_name, props.serial_number);
        }
    }
    if result.is_valid() {
        println!("OK");
        Ok(())
    } else {
        eprintln!("INVALID");
        eprintln!("{}", result.diagnostics());
        process::exit(1);
    }
}

fn cmd_info() -> Result<(), Error> {
    println!("Ljustero: enveloped XML-DSig and XAdES signatures");
    println!();
    println!("Default algorithms:");
    println!("  c14n      {}", ljustero_core::algorithm::DEFAULT_C14N);
    println!("  digest    {}", ljustero_core::algorithm::DEFAULT_DIGEST);
    println!("  signature {}", ljustero_core::algorithm::DEFAULT_SIGNATURE);
    println!();
    println!("Supported digest algorithms:");
    println!("  SHA-1, SHA-224, SHA-256, SHA-384, SHA-512");
    println!();
    println!("Supported signature algorithms:");
    println!("  RSA PKCS#1 v1.5 (SHA-1, SHA-224, SHA-256, SHA-384, SHA-512)");
    println!();
    println!("Supported canonicalization:");
    println!("  C14N 1.0 (±comments)");
    println!("  C14N 1.1 (±comments)");
    println!();
    println!("Supported key formats:");
    println!("  RSA private keys: PEM or DER, PKCS#8 or PKCS#1");
    println!("  X.509 certificates: PEM or DER");
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn context(id_attr: &[String]) -> DsigContext {
    let mut ctx = DsigContext::new();
    for attr in id_attr {
        ctx.add_id_attr(attr);
    }
    ctx
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), Error> {
    match path {
        Some(p) => Ok(std::fs::write(p, data)?),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout();
            stdout.write_all(data)?;
            Ok(stdout.write_all(b"\n")?)
        }
    }
}
