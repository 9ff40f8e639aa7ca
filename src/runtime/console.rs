use std::io::{self, BufRead, Write};

/// Input and output streams used by the `print` and `read` builtins.
pub struct Console<'a> {
    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
}

impl<'a> Console<'a> {
    pub fn new(input: impl BufRead + 'a, output: impl Write + 'a) -> Self {
        Console {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    /// Process stdin and stdout.
    pub fn stdio() -> Console<'static> {
        Console::new(io::stdin().lock(), io::stdout())
    }

    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }

    /// Reads one line without its terminator, or `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl Default for Console<'static> {
    fn default() -> Self {
        Console::stdio()
    }
}
