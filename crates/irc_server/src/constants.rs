//! Numeric reply codes and protocol-wide limits.
//!
//! Codes follow RFC 1459/2812 where they overlap; the 73x range is this
//! server's own extension for the file-transfer facility (spec §6).

pub const RPL_WELCOME: u16 = 1;

pub const RPL_NOTOPIC: u16 = 331;
pub const RPL_TOPIC: u16 = 332;
pub const RPL_INVITING: u16 = 341;
pub const RPL_NAMREPLY: u16 = 353;
pub const RPL_ENDOFNAMES: u16 = 366;
pub const RPL_CHANNELMODEIS: u16 = 324;

pub const ERR_NOSUCHNICK: u16 = 401;
pub const ERR_NOSUCHCHANNEL: u16 = 403;
pub const ERR_CANNOTSENDTOCHAN: u16 = 404;
pub const ERR_UNKNOWNCOMMAND: u16 = 421;
pub const ERR_NONICKNAMEGIVEN: u16 = 431;
pub const ERR_ERRONEUSNICKNAME: u16 = 432;
pub const ERR_NICKNAMEINUSE: u16 = 433;
pub const ERR_USERNOTINCHANNEL: u16 = 441;
pub const ERR_NOTONCHANNEL: u16 = 442;
pub const ERR_NOTREGISTERED: u16 = 451;
pub const ERR_NEEDMOREPARAMS: u16 = 461;
pub const ERR_ALREADYREGISTRED: u16 = 462;
pub const ERR_PASSWDMISMATCH: u16 = 464;
pub const ERR_CHANNELISFULL: u16 = 471;
pub const ERR_INVITEONLYCHAN: u16 = 473;
pub const ERR_BADCHANNELKEY: u16 = 475;
pub const ERR_CHANOPRIVSNEEDED: u16 = 482;

/// File-transfer offer delivered to the receiver.
pub const RPL_FILEOFFER: u16 = 738;
/// File-transfer offer acknowledged back to the sender.
pub const RPL_FILEOFFERSENT: u16 = 739;
/// One base64-encoded data chunk.
pub const RPL_FILEDATA: u16 = 740;
/// Transfer finished (sent to both parties).
pub const RPL_FILEDONE: u16 = 741;
/// Transfer accepted by the receiver.
pub const RPL_FILEACCEPTED: u16 = 742;
/// Transfer cancelled by either party.
pub const RPL_FILECANCELLED: u16 = 743;
/// Saved-path + size report.
pub const RPL_FILESAVED: u16 = 744;
/// CRC32 report.
pub const RPL_FILEHASH: u16 = 745;
/// Stream beginning (informational, sent before the first chunk).
pub const RPL_FILESTREAMBEGIN: u16 = 746;

/// Generic operator-facing error, used by the file-transfer engine.
pub const ERR_GENERIC: u16 = 400;

/// Soft cap on an inbound line, per spec §4.1 ("recommended soft cap").
/// Oversize lines are still parsed and dispatched, never truncated.
pub const SOFT_LINE_LIMIT: usize = 512;

/// Maximum bytes per raw file-transfer chunk before base64 encoding.
pub const FILE_CHUNK_SIZE: usize = 450;

/// Directory (relative to the server's working directory) where accepted
/// transfers are saved.
pub const UPLOADS_DIR: &str = "uploads";
