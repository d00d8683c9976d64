//! Calldata encoding and return decoding for the launchpad contracts.

use ethers::abi::{self, ParamType, Token};
use ethers::types::{Bytes, U256};
use ethers::utils::keccak256;

use super::ReadError;
use crate::types::{Address, EncryptedHandle, TokenRecord};

pub const CREATE_TOKEN: &str = "createToken(string,string)";
pub const GET_ALL_TOKENS: &str = "getAllTokens()";
pub const GET_TOKEN: &str = "getToken(uint256)";
pub const CONFIDENTIAL_BALANCE_OF: &str = "confidentialBalanceOf(address)";
pub const FREEMINT: &str = "freemint(uint64)";

/// First four bytes of the keccak hash of a function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

fn calldata(signature: &str, args: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&abi::encode(args));
    Bytes::from(data)
}

pub fn encode_create_token(name: &str, symbol: &str) -> Bytes {
    calldata(
        CREATE_TOKEN,
        &[Token::String(name.to_string()), Token::String(symbol.to_string())],
    )
}

pub fn encode_get_all_tokens() -> Bytes {
    calldata(GET_ALL_TOKENS, &[])
}

pub fn encode_get_token(index: u64) -> Bytes {
    calldata(GET_TOKEN, &[Token::Uint(U256::from(index))])
}

pub fn encode_confidential_balance_of(owner: Address) -> Bytes {
    calldata(CONFIDENTIAL_BALANCE_OF, &[Token::Address(owner)])
}

pub fn encode_freemint(amount: u64) -> Bytes {
    calldata(FREEMINT, &[Token::Uint(U256::from(amount))])
}

/// `(address token, string name, string symbol, address creator, uint256 initialSupply, uint256 createdAt)`
fn token_info_type() -> ParamType {
    ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::String,
        ParamType::String,
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Uint(256),
    ])
}

/// Decode the return data of `getAllTokens()`.
pub fn decode_token_list(data: &[u8]) -> Result<Vec<TokenRecord>, ReadError> {
    let mut tokens = abi::decode(&[ParamType::Array(Box::new(token_info_type()))], data)
        .map_err(|e| ReadError::Decode(e.to_string()))?;
    match tokens.pop() {
        Some(Token::Array(items)) => items.into_iter().map(record_from_token).collect(),
        other => Err(ReadError::Decode(format!("expected token array, got {:?}", other))),
    }
}

/// Decode the return data of `getToken(uint256)`.
pub fn decode_token(data: &[u8]) -> Result<TokenRecord, ReadError> {
    let mut tokens =
        abi::decode(&[token_info_type()], data).map_err(|e| ReadError::Decode(e.to_string()))?;
    match tokens.pop() {
        Some(token) => record_from_token(token),
        None => Err(ReadError::Decode("empty getToken response".into())),
    }
}

/// Decode the `bytes32` handle returned by `confidentialBalanceOf`.
pub fn decode_handle(data: &[u8]) -> Result<EncryptedHandle, ReadError> {
    let mut tokens = abi::decode(&[ParamType::FixedBytes(32)], data)
        .map_err(|e| ReadError::Decode(e.to_string()))?;
    match tokens.pop() {
        Some(Token::FixedBytes(bytes)) if bytes.len() == 32 => {
            let mut handle = [0u8; 32];
            handle.copy_from_slice(&bytes);
            Ok(EncryptedHandle(handle))
        }
        other => Err(ReadError::Decode(format!("expected bytes32, got {:?}", other))),
    }
}

/// ABI token for a registry entry, as the factory returns it.
pub fn token_from_record(record: &TokenRecord) -> Token {
    Token::Tuple(vec![
        Token::Address(record.token_address),
        Token::String(record.name.clone()),
        Token::String(record.symbol.clone()),
        Token::Address(record.creator),
        Token::Uint(record.initial_supply),
        Token::Uint(U256::from(record.created_at)),
    ])
}

fn record_from_token(token: Token) -> Result<TokenRecord, ReadError> {
    let fields = match token {
        Token::Tuple(fields) if fields.len() == 6 => fields,
        other => return Err(ReadError::Decode(format!("malformed token info: {:?}", other))),
    };

    let mut fields = fields.into_iter();
    let token_address = next_address(&mut fields, "token")?;
    let name = next_string(&mut fields, "name")?;
    let symbol = next_string(&mut fields, "symbol")?;
    let creator = next_address(&mut fields, "creator")?;
    let initial_supply = next_uint(&mut fields, "initialSupply")?;
    let created_at: u64 = next_uint(&mut fields, "createdAt")?
        .try_into()
        .map_err(|_| ReadError::Decode("createdAt does not fit in u64".into()))?;

    Ok(TokenRecord {
        token_address,
        name,
        symbol,
        creator,
        initial_supply,
        created_at,
    })
}

fn next_address(fields: &mut impl Iterator<Item = Token>, field: &str) -> Result<Address, ReadError> {
    match fields.next() {
        Some(Token::Address(address)) => Ok(address),
        other => Err(ReadError::Decode(format!("{}: expected address, got {:?}", field, other))),
    }
}

fn next_string(fields: &mut impl Iterator<Item = Token>, field: &str) -> Result<String, ReadError> {
    match fields.next() {
        Some(Token::String(value)) => Ok(value),
        other => Err(ReadError::Decode(format!("{}: expected string, got {:?}", field, other))),
    }
}

fn next_uint(fields: &mut impl Iterator<Item = Token>, field: &str) -> Result<U256, ReadError> {
    match fields.next() {
        Some(Token::Uint(value)) => Ok(value),
        other => Err(ReadError::Decode(format!("{}: expected uint, got {:?}", field, other))),
    }
}
