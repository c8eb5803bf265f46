//! 压缩包引用 → 字节 的边界
//!
//! 上传引用的解析属于外部传输层；本核心只消费一个可解析为
//! 原始字节的不透明句柄。大小超限的失败会进入编排层的错误分类，
//! 用单独的文案提示用户。

use async_trait::async_trait;
use tokio::fs;

use crate::error::{AppError, AppResult, FetchError};

/// 压缩包字节获取能力
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// 把引用解析为原始 ZIP 字节
    async fn fetch(&self, reference: &str) -> AppResult<Vec<u8>>;
}

/// 本地文件获取器（本地批处理模式 / 测试）
pub struct FsFetcher {
    max_bytes: u64,
}

impl FsFetcher {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl ArchiveFetcher for FsFetcher {
    async fn fetch(&self, reference: &str) -> AppResult<Vec<u8>> {
        let meta = fs::metadata(reference)
            .await
            .map_err(|e| AppError::fetch_failed(reference, e))?;
        if meta.len() > self.max_bytes {
            return Err(AppError::Fetch(FetchError::SizeExceeded {
                size: meta.len(),
                limit: self.max_bytes,
            }));
        }
        fs::read(reference)
            .await
            .map_err(|e| AppError::fetch_failed(reference, e))
    }
}

/// HTTP 获取器（URL 形式的引用）
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_bytes,
        }
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, reference: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get(reference)
            .send()
            .await
            .map_err(|e| AppError::fetch_failed(reference, e))?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(AppError::Fetch(FetchError::SizeExceeded {
                    size: len,
                    limit: self.max_bytes,
                }));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch_failed(reference, e))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(AppError::Fetch(FetchError::SizeExceeded {
                size: bytes.len() as u64,
                limit: self.max_bytes,
            }));
        }

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_fetcher_enforces_size_limit() {
        tokio_test::block_on(async {
            let path = std::env::temp_dir().join(format!("fetch_{}.zip", uuid::Uuid::new_v4()));
            std::fs::write(&path, vec![0u8; 64]).unwrap();

            let small = FsFetcher::new(16);
            let err = small.fetch(&path.to_string_lossy()).await.unwrap_err();
            assert!(err.is_size_exceeded());

            let roomy = FsFetcher::new(1024);
            assert_eq!(roomy.fetch(&path.to_string_lossy()).await.unwrap().len(), 64);

            let _ = std::fs::remove_file(&path);
        });
    }

    #[test]
    fn test_fs_fetcher_missing_file() {
        tokio_test::block_on(async {
            let fetcher = FsFetcher::new(1024);
            let err = fetcher.fetch("/no/such/file.zip").await.unwrap_err();
            assert!(!err.is_size_exceeded());
        });
    }

    /// 本地一次性 HTTP 服务，返回固定长度的响应体
    fn serve_bytes(body_len: usize, requests: usize) -> (String, std::thread::JoinHandle<()>) {
        use std::io::{Read as _, Write as _};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = std::thread::spawn(move || {
            for _ in 0..requests {
                let (mut stream, _) = listener.accept().unwrap();
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf);
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body_len
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(&vec![b'x'; body_len]).unwrap();
            }
        });
        (format!("http://{}/bundle.zip", addr), handle)
    }

    #[test]
    fn test_http_fetcher_enforces_size_limit() {
        let (url, handle) = serve_bytes(64, 2);
        tokio_test::block_on(async {
            // Content-Length 预检查就能拒绝
            let small = HttpFetcher::new(16);
            let err = small.fetch(&url).await.unwrap_err();
            assert!(err.is_size_exceeded());

            let roomy = HttpFetcher::new(1024);
            assert_eq!(roomy.fetch(&url).await.unwrap().len(), 64);
        });
        handle.join().unwrap();
    }
}
