//! `visitorpass` developer CLI: drives the backend contract one call at a
//! time, without the wizard.

use std::path::PathBuf;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;

use vp_core::ports::{FrameEncoderPort, OtpApiPort, SelfieUploadPort, VisitorApiPort};
use vp_core::registration::{OtpCode, PhoneNumber, RegistrationRequest};
use vp_core::{RegistrationForm, TransactionId, VisitDuration, VisitPurpose, VisitorId, WizardConfig};
use vp_infra::ImageFrameEncoder;

use crate::bootstrap::{load_or_default, resolve_config_path, wire_backend};

#[derive(Debug, Parser)]
#[command(name = "visitorpass")]
#[command(about = "Visitor pass registration backend client", long_about = None)]
pub struct Cli {
    /// Bearer token for the backend
    #[arg(long, global = true, env = "VISITORPASS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file (defaults to VISITORPASS_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a verification code to a phone number
    SendOtp {
        #[arg(long)]
        phone: String,
    },
    /// Check a code against a transaction
    VerifyOtp {
        #[arg(long)]
        txn_id: String,
        #[arg(long)]
        code: String,
    },
    /// Upload an image file as the visitor selfie
    UploadSelfie {
        #[arg(long)]
        file: PathBuf,
    },
    /// Create the visitor request for an uploaded selfie
    Submit {
        #[arg(long)]
        visitor_id: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        #[arg(long)]
        govt_id: String,
        /// business, interview, meeting, delivery, maintenance, personal or other
        #[arg(long)]
        purpose: VisitPurpose,
        #[arg(long)]
        person_to_meet: String,
        #[arg(long)]
        department: String,
        /// Whole hours, 1 to 24
        #[arg(long)]
        duration: VisitDuration,
    },
    /// Generate the pass for a registered visitor
    Pass {
        #[arg(long)]
        visitor_id: String,
    },
    /// Print the resolved configuration
    Config,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.or_else(resolve_config_path);
    let config = load_or_default(config_path.as_deref())?;

    if let Commands::Config = cli.command {
        return print_config(&config);
    }

    let backend = wire_backend(&config, cli.token)?;
    match cli.command {
        Commands::SendOtp { phone } => {
            let phone = PhoneNumber::parse(&phone)?;
            let txn_id = backend.otp.send_otp(&phone).await?;
            info!(transaction_id = %txn_id, "verification code sent");
            print_json(&json!({ "txnId": txn_id.as_str() }))
        }
        Commands::VerifyOtp { txn_id, code } => {
            let code = OtpCode::parse(&code)?;
            let verified = backend
                .otp
                .verify_otp(&TransactionId::from(txn_id), &code)
                .await?;
            if !verified {
                bail!("verification code was rejected");
            }
            print_json(&json!({ "verified": true }))
        }
        Commands::UploadSelfie { file } => {
            let raw = std::fs::read(&file)
                .with_context(|| format!("Failed to read image file: {}", file.display()))?;
            let jpeg = ImageFrameEncoder::new()
                .normalize_image(&raw, config.camera.jpeg_quality)
                .context("File is not a usable image")?;
            let upload = backend.visitor.upload_selfie(Bytes::from(jpeg)).await?;
            print_json(&json!({
                "visitorId": upload.visitor_id.as_str(),
                "visitorSelfieUrl": upload.selfie_url,
            }))
        }
        Commands::Submit {
            visitor_id,
            phone,
            name,
            company,
            govt_id,
            purpose,
            person_to_meet,
            department,
            duration,
        } => {
            let phone = PhoneNumber::parse(&phone)?;
            let form = RegistrationForm::new()
                .with_phone(phone.as_str())
                .with_purpose(purpose)
                .with_details(name, company, govt_id)
                .with_meeting(person_to_meet, department, Some(duration));
            let request = RegistrationRequest::from_form(&form)?;
            let visitor_id = VisitorId::from(visitor_id);
            backend.visitor.submit_request(&visitor_id, &request).await?;
            info!(visitor_id = %visitor_id, "visitor request created");
            print_json(&json!({ "visitorId": visitor_id.as_str(), "registered": true }))
        }
        Commands::Pass { visitor_id } => {
            let details = backend
                .visitor
                .generate_pass(&VisitorId::from(visitor_id))
                .await?;
            print_json(&details)
        }
        Commands::Config => print_config(&config),
    }
}

fn print_config(config: &WizardConfig) -> anyhow::Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render config")?;
    print!("{rendered}");
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
