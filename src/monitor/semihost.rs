use log::*;

use crate::buffer::Buffer;
use crate::conn::ConnectionExt;
use crate::monitor::core_impl::MonitorImpl;
use crate::monitor::error::MonitorError as Error;
use crate::platform::semihost::SemihostRequest;
use crate::platform::Platform;

impl<P: Platform, C: ConnectionExt> MonitorImpl<P, C> {
    /// Forward the program's semihosting call to the host, and handle
    /// commands until the host's `F` reply resumes the program.
    ///
    /// Returns `false` if there was no request to forward.
    pub(crate) fn handle_semihost_request(
        &mut self,
        conn: &mut C,
        buf: &mut Buffer<'_>,
        platform: &mut P,
    ) -> Result<bool, Error<C::Error>> {
        let request = match platform
            .support_semihosting()
            .and_then(|ops| ops.semihost_request())
        {
            Some(request) => request,
            None => return Ok(false),
        };

        debug!("forwarding semihost request: {:?}", request);
        write_file_io_request(buf, &request);
        self.send_packet(conn, buf)?;
        self.command_loop(conn, buf, platform)?;
        Ok(true)
    }
}

/// Render `request` as a File-I/O request packet.
fn write_file_io_request(buf: &mut Buffer<'_>, request: &SemihostRequest) {
    buf.reset();
    match *request {
        SemihostRequest::Open {
            path,
            path_len,
            flags,
            mode,
        } => {
            buf.write_str("Fopen,");
            write_pointer_len(buf, path, path_len);
            buf.write_byte(b',');
            buf.write_num(flags);
            buf.write_byte(b',');
            buf.write_num(mode);
        }
        SemihostRequest::Close { fd } => {
            buf.write_str("Fclose,");
            buf.write_num(fd);
        }
        SemihostRequest::Read { fd, buf: ptr, len } => {
            buf.write_str("Fread,");
            write_fd_buf_len(buf, fd, ptr, len);
        }
        SemihostRequest::Write { fd, buf: ptr, len } => {
            buf.write_str("Fwrite,");
            write_fd_buf_len(buf, fd, ptr, len);
        }
        SemihostRequest::Lseek { fd, offset, whence } => {
            buf.write_str("Flseek,");
            buf.write_num(fd);
            buf.write_byte(b',');
            buf.write_int(offset);
            buf.write_byte(b',');
            buf.write_num(whence);
        }
        SemihostRequest::Unlink { path, path_len } => {
            buf.write_str("Funlink,");
            write_pointer_len(buf, path, path_len);
        }
    }
}

fn write_pointer_len(buf: &mut Buffer<'_>, ptr: u32, len: u32) {
    buf.write_num(ptr);
    buf.write_byte(b'/');
    buf.write_num(len);
}

fn write_fd_buf_len(buf: &mut Buffer<'_>, fd: u32, ptr: u32, len: u32) {
    buf.write_num(fd);
    buf.write_byte(b',');
    buf.write_num(ptr);
    buf.write_byte(b',');
    buf.write_num(len);
}

#[cfg(test)]
mod tests {
    use super::*;

    use managed::ManagedSlice;

    fn render(request: SemihostRequest) -> String {
        let mut storage = [0; 64];
        let mut buf = Buffer::new(ManagedSlice::Borrowed(&mut storage));
        write_file_io_request(&mut buf, &request);
        String::from_utf8(buf.as_slice().to_vec()).unwrap()
    }

    #[test]
    fn file_io_requests() {
        assert_eq!(
            render(SemihostRequest::Open {
                path: 0x2000_0100,
                path_len: 9,
                flags: 0x601,
                mode: 0x1a4,
            }),
            "Fopen,20000100/9,601,1a4"
        );
        assert_eq!(render(SemihostRequest::Close { fd: 3 }), "Fclose,3");
        assert_eq!(
            render(SemihostRequest::Write {
                fd: 1,
                buf: 0x2000_0000,
                len: 0x10,
            }),
            "Fwrite,1,20000000,10"
        );
        assert_eq!(
            render(SemihostRequest::Lseek {
                fd: 4,
                offset: -16,
                whence: 2,
            }),
            "Flseek,4,-10,2"
        );
        assert_eq!(
            render(SemihostRequest::Unlink {
                path: 0x100,
                path_len: 5,
            }),
            "Funlink,100/5"
        );
    }
}
