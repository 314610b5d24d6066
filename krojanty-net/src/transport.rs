//! Fixed-width token I/O over any async byte stream

use crate::error::{NetError, ProtocolError};
use crate::token::{Token, TOKEN_LEN};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read exactly one token's worth of bytes.
///
/// Returns `Ok(None)` when the peer closed cleanly between tokens. A close
/// in the middle of a token is an error, never a short success.
pub async fn read_token<R>(reader: &mut R) -> Result<Option<[u8; TOKEN_LEN]>, NetError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; TOKEN_LEN];
    let mut filled = 0;
    while filled < TOKEN_LEN {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            return match filled {
                0 => Ok(None),
                received => Err(NetError::ClosedMidToken { received }),
            };
        }
        filled += n;
    }
    Ok(Some(buf))
}

/// Write all four bytes of a token and flush
pub async fn write_token<W>(writer: &mut W, token: &Token) -> Result<(), NetError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&token.to_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Validate a textual move and send it. Nothing is written when the
/// payload is missing or not a well-formed token.
pub async fn send_message<W>(writer: &mut W, message: Option<&str>) -> Result<(), NetError>
where
    W: AsyncWrite + Unpin,
{
    let message = message.ok_or(ProtocolError::MissingPayload)?;
    let token: Token = message.parse()?;
    write_token(writer, &token).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use krojanty_core::Square;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_token_over_duplex() {
        let (mut a, mut b) = duplex(64);
        let token = Token::new(Square::at(0, 0), Square::at(0, 1));
        write_token(&mut a, &token).await.unwrap();
        let bytes = read_token(&mut b).await.unwrap();
        assert_eq!(bytes, Some(*b"A9B9"));
    }

    #[tokio::test]
    async fn test_split_writes_are_reassembled() {
        let (mut a, mut b) = duplex(64);
        let reader = tokio::spawn(async move { read_token(&mut b).await });
        a.write_all(b"E5").await.unwrap();
        tokio::task::yield_now().await;
        a.write_all(b"E4").await.unwrap();
        let bytes = reader.await.unwrap().unwrap();
        assert_eq!(bytes, Some(*b"E5E4"));
    }

    #[tokio::test]
    async fn test_clean_close_is_none() {
        let (a, mut b) = duplex(64);
        drop(a);
        assert!(matches!(read_token(&mut b).await, Ok(None)));
    }

    #[tokio::test]
    async fn test_close_mid_token_is_error() {
        let (mut a, mut b) = duplex(64);
        a.write_all(b"A9B").await.unwrap();
        drop(a);
        let err = read_token(&mut b).await.unwrap_err();
        assert!(matches!(err, NetError::ClosedMidToken { received: 3 }));
    }

    #[tokio::test]
    async fn test_send_message_validates_first() {
        let (mut a, mut b) = duplex(64);
        let short = send_message(&mut a, Some("ABC")).await;
        assert!(matches!(short, Err(NetError::Protocol(ProtocolError::WrongLength(3)))));
        let missing = send_message(&mut a, None).await;
        assert!(matches!(missing, Err(NetError::Protocol(ProtocolError::MissingPayload))));

        send_message(&mut a, Some("c7c5")).await.unwrap();
        drop(a);
        // only the valid token made it onto the wire
        assert_eq!(read_token(&mut b).await.unwrap(), Some(*b"C7C5"));
        assert!(read_token(&mut b).await.unwrap().is_none());
    }
}
