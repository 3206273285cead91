pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpClient {
    /// Issues a blocking GET. Transport failures are errors; any status the
    /// server sends back, including 4xx and 5xx, is a response.
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<HttpResponse>;
}
