//! A deployed protocol with its token and collaborators.

use crate::issuer::AuthorizationIssuer;
use crate::protocol::Protocol;
use mint_chain::{Chain, EventBus};
use mint_config::Config;
use mint_token::SignatureMintToken;
use mint_types::{MintEvent, ProtocolEvent, TokenEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Everything a running service needs: chain, contracts and the optional issuer.
#[derive(Clone)]
pub struct MintEngine {
	config: Config,
	chain: Arc<Chain>,
	token: Arc<SignatureMintToken>,
	protocol: Arc<Protocol>,
	issuer: Option<Arc<AuthorizationIssuer>>,
}

impl MintEngine {
	pub fn new(
		config: Config,
		chain: Arc<Chain>,
		token: Arc<SignatureMintToken>,
		protocol: Arc<Protocol>,
		issuer: Option<Arc<AuthorizationIssuer>>,
	) -> Self {
		Self {
			config,
			chain,
			token,
			protocol,
			issuer,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn chain(&self) -> &Arc<Chain> {
		&self.chain
	}

	pub fn token(&self) -> &Arc<SignatureMintToken> {
		&self.token
	}

	pub fn protocol(&self) -> &Arc<Protocol> {
		&self.protocol
	}

	/// Issuer signing authorizations, if a signing account is configured.
	pub fn issuer(&self) -> Option<&Arc<AuthorizationIssuer>> {
		self.issuer.as_ref()
	}

	pub fn event_bus(&self) -> &EventBus {
		self.chain.event_bus()
	}

	/// Logs every committed event until the bus is closed.
	pub fn spawn_event_logger(&self) -> JoinHandle<()> {
		let mut receiver = self.event_bus().subscribe();
		tokio::spawn(async move {
			loop {
				match receiver.recv().await {
					Ok(event) => log_event(&event),
					Err(RecvError::Lagged(skipped)) => {
						tracing::warn!(skipped, "Event logger lagged behind");
					},
					Err(RecvError::Closed) => break,
				}
			}
		})
	}
}

fn log_event(event: &MintEvent) {
	match event {
		MintEvent::Protocol(ProtocolEvent::SignatureMint {
			caller,
			recipient,
			amount,
			..
		}) => {
			tracing::info!(%caller, %recipient, %amount, "SignatureMint");
		},
		MintEvent::Protocol(ProtocolEvent::Deployed { protocol, .. }) => {
			tracing::info!(%protocol, "Protocol deployed");
		},
		MintEvent::Token(TokenEvent::Transfer { from, to, amount, .. }) => {
			tracing::debug!(%from, %to, %amount, "Transfer");
		},
		MintEvent::Token(TokenEvent::ProtocolChanged { previous, new, .. }) => {
			tracing::info!(%previous, %new, "ProtocolChanged");
		},
		MintEvent::Token(TokenEvent::OwnershipTransferred { previous, new, .. }) => {
			tracing::info!(%previous, %new, "OwnershipTransferred");
		},
	}
}
