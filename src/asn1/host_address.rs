use der::asn1::OctetString;
use der::Sequence;

/// ```text
/// HostAddress     ::= SEQUENCE  {
///         addr-type       [0] Int32,
///         address         [1] OCTET STRING
/// }
/// ````
#[derive(Debug, Clone, Eq, PartialEq, Sequence)]
pub struct HostAddress {
    #[asn1(context_specific = "0")]
    pub addr_type: i32,
    #[asn1(context_specific = "1")]
    pub address: OctetString,
}

/// ```text
/// -- NOTE: HostAddresses is always used as an OPTIONAL field and
/// -- should not be empty.
/// HostAddresses   -- NOTE: subtly different from rfc1510,
///                 -- but has a value mapping and encodes the same
///         ::= SEQUENCE OF HostAddress
/// ````
pub type HostAddresses = Vec<HostAddress>;

pub const ADDR_TYPE_IPV4: i32 = 2;
pub const ADDR_TYPE_IPV6: i32 = 24;
pub const ADDR_TYPE_NETBIOS: i32 = 20;
