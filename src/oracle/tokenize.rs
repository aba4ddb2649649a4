/// Host-side `strtok`: leading delimiters are skipped, each token is a
/// maximal run of non-delimiter bytes, and exhaustion is reported as `None`
/// on every later call.
#[derive(Debug, Clone)]
pub struct HostTokenizer {
    input: Vec<u8>,
    delimiters: Vec<u8>,
    position: usize,
}

impl HostTokenizer {
    pub fn new(input: &[u8], delimiters: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            delimiters: delimiters.to_vec(),
            position: 0,
        }
    }

    fn is_delimiter(&self, byte: u8) -> bool {
        self.delimiters.contains(&byte)
    }

    pub fn next_token(&mut self) -> Option<Vec<u8>> {
        while self.position < self.input.len() && self.is_delimiter(self.input[self.position]) {
            self.position += 1;
        }
        if self.position >= self.input.len() {
            return None;
        }

        let start = self.position;
        while self.position < self.input.len() && !self.is_delimiter(self.input[self.position]) {
            self.position += 1;
        }
        let token = self.input[start..self.position].to_vec();
        // Step over the delimiter that ended the token
        if self.position < self.input.len() {
            self.position += 1;
        }
        Some(token)
    }
}

impl Iterator for HostTokenizer {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}
