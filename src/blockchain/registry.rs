// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Veralix

//! Veralix certificate registry contract bindings.

use alloy::{
    primitives::{Address, U256},
    rpc::types::Log,
    sol,
};

// Registry interface: ERC-1155 style balances plus the certificate record.
sol! {
    #[sol(rpc)]
    interface IVeralixRegistry {
        function createCertificate(address to, string certificateId, string metadataURI) external returns (uint256);
        function ownerOf(uint256 tokenId) external view returns (address);
        function uri(uint256 id) external view returns (string);
        function balanceOf(address account, uint256 id) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function certificates(uint256 tokenId) external view returns (
            uint256 tokenId,
            string certificateNumber,
            string jewelryType,
            string description,
            string imageHash,
            string metadataURI,
            address currentOwner,
            address jewelryStore,
            uint256 creationDate,
            uint256 lastUpdate,
            bool isActive,
            bool isTransferable,
            uint256 appraisalValue,
            string appraisalCurrency
        );

        event CertificateCreated(uint256 indexed tokenId, string certificateNumber, address indexed owner);
        event TransferSingle(address indexed operator, address indexed from, address indexed to, uint256 id, uint256 value);
    }
}

// ERC-721 mint event, kept apart so it does not clash with ERC-20 `Transfer`.
sol! {
    interface IERC721Events {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

/// Extract the minted token id from a receipt's logs.
///
/// Only logs emitted by `registry` are considered. `CertificateCreated` wins
/// over an ERC-1155 `TransferSingle` mint, which wins over an ERC-721
/// `Transfer` mint (from the zero address).
pub fn decode_minted_token_id(logs: &[Log], registry: Address) -> Option<U256> {
    let own: Vec<&Log> = logs.iter().filter(|log| log.address() == registry).collect();

    let created = own.iter().find_map(|log| {
        log.log_decode::<IVeralixRegistry::CertificateCreated>()
            .ok()
            .map(|decoded| decoded.inner.data.tokenId)
    });
    if created.is_some() {
        return created;
    }

    let single = own.iter().find_map(|log| {
        log.log_decode::<IVeralixRegistry::TransferSingle>()
            .ok()
            .filter(|decoded| decoded.inner.data.from == Address::ZERO)
            .map(|decoded| decoded.inner.data.id)
    });
    if single.is_some() {
        return single;
    }

    own.iter().find_map(|log| {
        log.log_decode::<IERC721Events::Transfer>()
            .ok()
            .filter(|decoded| decoded.inner.data.from == Address::ZERO)
            .map(|decoded| decoded.inner.data.tokenId)
    })
}
