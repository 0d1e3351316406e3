use clap::{Parser, Subcommand};
use krimes_core::asn1::ap_req::ApReq;
use krimes_core::asn1::constants::EncryptionType;
use krimes_core::asn1::enc_ticket_part::EncTicketPart;
use krimes_core::asn1::ticket::Ticket;
use krimes_core::config::ValidatorConfig;
use krimes_core::crypto::{CryptoProvider, KerberosKey, KeyUsage};
use krimes_core::message::{classify, KrbMessage};
use krimes_core::restriction;
use krimes_core::time::{FixedClock, SystemClock};
use krimes_core::validation::ApReqValidator;
use krimes_core::{envelope, KrbError};
use std::fs;
use std::io;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, error, info};

#[derive(Debug, clap::Parser)]
#[clap(about = "Inspect and check Kerberos messages")]
struct OptParser {
    #[clap(subcommand)]
    command: Opt,
}

#[derive(Debug, Subcommand)]
enum Opt {
    /// Print which message the input holds, from its outer tag only.
    Classify { input: PathBuf },
    /// Decode and print the whole message.
    Decode { input: PathBuf },
    /// Decrypt a Ticket, or the ticket inside an AP-REQ, with a hex service key.
    Ticket {
        input: PathBuf,
        #[clap(long, env = "KRIMES_SERVICE_KEY")]
        key: String,
        #[clap(long, default_value_t = 18)]
        etype: i32,
        #[clap(long, default_value_t = 5)]
        max_depth: usize,
    },
    /// Run the full AP-REQ validation with the keys of a validator config.
    Validate {
        config: PathBuf,
        input: PathBuf,
        /// Validate as of this unix time instead of now.
        #[clap(long)]
        at: Option<u64>,
    },
}

/// Input files may hold raw DER or the same bytes as hex text.
fn read_input(path: &Path) -> io::Result<Vec<u8>> {
    let mut raw = Vec::new();
    if path.as_os_str() == "-" {
        io::stdin().read_to_end(&mut raw)?;
    } else {
        raw = fs::read(path)?;
    }

    let text: String = String::from_utf8_lossy(&raw)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    match hex::decode(&text) {
        Ok(bytes) if !text.is_empty() => {
            debug!("input read as hex");
            Ok(bytes)
        }
        _ => Ok(raw),
    }
}

fn ticket_from(bytes: &[u8]) -> Result<Ticket, KrbError> {
    match KrbMessage::from_bytes(bytes) {
        Ok(KrbMessage::ApReq(ap_req)) => Ok(ap_req.into_inner().ticket),
        _ => krimes_core::asn1::decode::<Ticket>(bytes).map_err(KrbError::from),
    }
}

fn main_ticket(bytes: &[u8], key: &str, etype: i32, max_depth: usize) -> Result<(), KrbError> {
    let key = hex::decode(key).map_err(|err| {
        error!(?err, "Service key is not hex");
        KrbError::InvalidEncryptionKey
    })?;
    let etype = EncryptionType::try_from(etype).map_err(|_| KrbError::UnsupportedEncryption)?;
    let key = KerberosKey::new(etype, None, key);

    let ticket = ticket_from(bytes)?;
    info!(realm = %ticket.realm, sname = %ticket.sname, kvno = ?ticket.enc_part.kvno);

    let provider = CryptoProvider::default();
    let part: EncTicketPart = envelope::open(&ticket.enc_part, &key, KeyUsage::TICKET, &provider)?;
    println!("{:#?}", part);

    if let Some(ad) = &part.authorization_data {
        let expanded = restriction::expand(ad, max_depth)?;
        println!("{:#?}", expanded);
    }
    Ok(())
}

fn main_validate(config: &Path, bytes: &[u8], at: Option<u64>) -> Result<(), KrbError> {
    let config = ValidatorConfig::parse(config)?;
    let validator = match at {
        Some(secs) => ApReqValidator::from_config(
            &config,
            Arc::new(FixedClock::new(UNIX_EPOCH + Duration::from_secs(secs))),
        )?,
        None => ApReqValidator::from_config(&config, Arc::new(SystemClock))?,
    };

    let ap_req: ApReq = krimes_core::asn1::decode(bytes)?;
    let validated = validator.validate(&ap_req)?;
    println!(
        "accepted {}@{} for {}",
        validated.client_name(),
        validated.client_realm(),
        validated.service_name
    );
    for entry in restriction::leaves(&validated.restrictions) {
        println!("  ad-type {}: {:?}", entry.ad_type(), entry);
    }
    Ok(())
}

fn run(opt: Opt) -> Result<(), KrbError> {
    match opt {
        Opt::Classify { input } => {
            let bytes = read_input(&input).map_err(|_| KrbError::IoError)?;
            let msg_type = classify(&bytes)?;
            println!("{}", msg_type);
            Ok(())
        }
        Opt::Decode { input } => {
            let bytes = read_input(&input).map_err(|_| KrbError::IoError)?;
            let msg = KrbMessage::from_bytes(&bytes)?;
            println!("{:#?}", msg);
            Ok(())
        }
        Opt::Ticket {
            input,
            key,
            etype,
            max_depth,
        } => {
            let bytes = read_input(&input).map_err(|_| KrbError::IoError)?;
            main_ticket(&bytes, &key, etype, max_depth)
        }
        Opt::Validate { config, input, at } => {
            let bytes = read_input(&input).map_err(|_| KrbError::IoError)?;
            main_validate(&config, &bytes, at)
        }
    }
}

fn main() -> ExitCode {
    let opt = OptParser::parse();

    tracing_subscriber::fmt::init();

    match run(opt.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, code = ?err.error_code());
            ExitCode::FAILURE
        }
    }
}
