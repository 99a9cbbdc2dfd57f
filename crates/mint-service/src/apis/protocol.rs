//! Static information about the deployed protocol.

use mint_core::MintEngine;
use mint_types::ProtocolInfo;

/// Describes the protocol instance, its token and its signing domain.
pub fn protocol_info(engine: &MintEngine) -> ProtocolInfo {
	let protocol = engine.protocol();
	let domain = protocol.domain();

	ProtocolInfo {
		protocol: protocol.address(),
		token: protocol.mintable_token(),
		mint_signer: protocol.mint_signer(),
		chain_id: domain.chain_id(),
		domain_name: domain.name().to_string(),
		domain_version: domain.version().to_string(),
		domain_separator: domain.separator(),
	}
}
