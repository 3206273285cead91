use std::cell::RefCell;
use std::time::Duration;

use anyhow::{anyhow, bail};
use bindicator::svc::{HttpClient, HttpResponse};
use embedded_svc::http::client::Client;
use embedded_svc::http::{Method, Status};
use embedded_svc::io::Read;
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

const TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_LEN: usize = 16 * 1024;

/// HTTPS client verifying servers against the bundled root certificates.
pub struct EspHttpClient {
    client: RefCell<Client<EspHttpConnection>>,
}

impl EspHttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let config = Configuration {
            timeout: Some(TIMEOUT),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        let client = Client::wrap(EspHttpConnection::new(&config)?);
        Ok(Self {
            client: RefCell::new(client),
        })
    }
}

impl HttpClient for EspHttpClient {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<HttpResponse> {
        let mut client = self.client.try_borrow_mut()?;
        let request = client.request(Method::Get, url, headers)?;
        let mut response = request.submit()?;

        let status = response.status();
        let mut body = Vec::new();
        let mut chunk = [0_u8; 512];

        loop {
            let read = response.read(&mut chunk).map_err(|e| anyhow!("{e:?}"))?;
            if read == 0 {
                break;
            }
            if body.len() + read > MAX_BODY_LEN {
                bail!("response body exceeds {MAX_BODY_LEN} bytes");
            }
            body.extend_from_slice(&chunk[..read]);
        }

        log::debug!("GET {url} -> {status}, {} bytes", body.len());

        Ok(HttpResponse { status, body })
    }
}
