#![allow(dead_code)]

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::{Duration, sleep},
};

/// How a scripted response ends after its chunks are written.
#[derive(Debug, Clone, Copy)]
pub enum Tail {
    /// Send the terminating zero-length chunk.
    Close,
    /// Keep the connection open without sending anything else.
    Hang,
    /// Announce a chunk, send only part of it, then close the socket.
    Truncate,
}

/// One scripted HTTP response, written as separate transfer-encoding chunks
/// so the client sees each entry as its own network read.
#[derive(Debug, Clone)]
pub struct Reply {
    pub chunks: Vec<Vec<u8>>,
    pub tail: Tail,
}

impl Reply {
    pub fn chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self {
            chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(),
            tail: Tail::Close,
        }
    }

    pub fn hanging(mut self) -> Self {
        self.tail = Tail::Hang;
        self
    }

    pub fn truncated(mut self) -> Self {
        self.tail = Tail::Truncate;
        self
    }
}

/// Serve `replies` in order, one connection each. Returns the base URL.
pub async fn serve_chunked(replies: Vec<Reply>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for reply in replies {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::spawn(handle(socket, reply));
        }
    });

    format!("http://{addr}")
}

async fn handle(mut socket: TcpStream, reply: Reply) {
    read_request(&mut socket).await;

    let head = "HTTP/1.1 200 OK\r\ncontent-type: text/plain;charset=UTF-8\r\ntransfer-encoding: chunked\r\nconnection: close\r\n\r\n";
    socket.write_all(head.as_bytes()).await.unwrap();
    socket.flush().await.unwrap();

    for chunk in &reply.chunks {
        let mut framed = format!("{:x}\r\n", chunk.len()).into_bytes();
        framed.extend_from_slice(chunk);
        framed.extend_from_slice(b"\r\n");
        socket.write_all(&framed).await.unwrap();
        socket.flush().await.unwrap();
        sleep(Duration::from_millis(40)).await;
    }

    match reply.tail {
        Tail::Close => {
            socket.write_all(b"0\r\n\r\n").await.unwrap();
            socket.flush().await.unwrap();
        }
        Tail::Hang => std::future::pending::<()>().await,
        Tail::Truncate => {
            socket.write_all(b"100\r\ntextContent=cut").await.unwrap();
            socket.flush().await.unwrap();
            socket.shutdown().await.unwrap();
        }
    }
}

async fn read_request(socket: &mut TcpStream) {
    let mut buffer = Vec::new();
    loop {
        let mut chunk = [0u8; 1024];
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buffer.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let header_end = pos + 4;
            let headers = String::from_utf8_lossy(&buffer[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length: "))
                .and_then(|len| len.trim().parse::<usize>().ok())
                .unwrap_or(0);

            let mut body_len = buffer.len() - header_end;
            while body_len < content_length {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                body_len += n;
            }
            return;
        }
    }
}
