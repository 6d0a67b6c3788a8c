use std::collections::VecDeque;
use std::fmt;
use super::memory::{Memory, Pointer};

/// Errors that abort a run. Each carries the address of the faulting
/// instruction. A failed step leaves the VM state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid opcode in instruction {word} at {ip}")]
    InvalidOpcode { word: i64, ip: usize },
    #[error("input exhausted at {ip}")]
    InputExhausted { ip: usize },
    #[error("invalid write target (immediate mode) at {ip}")]
    InvalidWriteTarget { ip: usize },
    #[error("instruction pointer {ip} out of bounds")]
    OutOfBounds { ip: usize },
    #[error("invalid parameter mode {mode} at {ip}")]
    InvalidMode { mode: i64, ip: usize },
    #[error("invalid address {address} at {ip}")]
    InvalidAddress { address: i64, ip: usize },
    #[error("arithmetic overflow at {ip}")]
    Overflow { ip: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidOpcode,
    InputExhausted,
    InvalidWriteTarget,
    OutOfBounds,
    InvalidMode,
    InvalidAddress,
    Overflow,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::InvalidOpcode { .. } => ErrorKind::InvalidOpcode,
            Error::InputExhausted { .. } => ErrorKind::InputExhausted,
            Error::InvalidWriteTarget { .. } => ErrorKind::InvalidWriteTarget,
            Error::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            Error::InvalidMode { .. } => ErrorKind::InvalidMode,
            Error::InvalidAddress { .. } => ErrorKind::InvalidAddress,
            Error::Overflow { .. } => ErrorKind::Overflow,
        }
    }

    pub fn ip(&self) -> usize {
        match *self {
            Error::InvalidOpcode { ip, .. }
            | Error::InputExhausted { ip }
            | Error::InvalidWriteTarget { ip }
            | Error::OutOfBounds { ip }
            | Error::InvalidMode { ip, .. }
            | Error::InvalidAddress { ip, .. }
            | Error::Overflow { ip } => ip,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Position,
    Immediate,
    Relative,
}

/// Mode digits of an instruction word, consumed one per parameter.
struct Modes {
    digits: i64,
    ip: usize,
}

impl Modes {
    fn next(&mut self) -> Result<Mode, Error> {
        let digit = self.digits % 10;
        self.digits /= 10;
        match digit {
            0 => Ok(Mode::Position),
            1 => Ok(Mode::Immediate),
            2 => Ok(Mode::Relative),
            mode => Err(Error::InvalidMode { mode, ip: self.ip }),
        }
    }
}

trait FromPointer: Sized {
    fn from_pointer(ptr: &mut Pointer, modes: &mut Modes) -> Result<Self, Error>;
}


#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Position(i64),
    Immediate(i64),
    Relative(i64),
}

impl Param {
    pub fn new(mode: Mode, raw: i64) -> Param {
        match mode {
            Mode::Position => Param::Position(raw),
            Mode::Immediate => Param::Immediate(raw),
            Mode::Relative => Param::Relative(raw),
        }
    }

    fn address(&self, vm: &Vm) -> Result<usize, Error> {
        match *self {
            Param::Position(p) => vm.address(p),
            Param::Immediate(_) => Err(Error::InvalidWriteTarget { ip: vm.ip }),
            Param::Relative(p) => {
                let addr = vm.relative_base.checked_add(p).ok_or(Error::Overflow { ip: vm.ip })?;
                vm.address(addr)
            },
        }
    }

    pub fn get(&self, vm: &Vm) -> Result<i64, Error> {
        match *self {
            Param::Immediate(n) => Ok(n),
            _ => self.address(vm).map(|addr| vm.mem[addr]),
        }
    }

    pub fn set(&self, vm: &mut Vm, value: i64) -> Result<(), Error> {
        let addr = self.address(vm)?;
        vm.write(addr, value)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Param::Position(p) => write!(f, "[{}]", p),
            Param::Immediate(n) => write!(f, "{}", n),
            Param::Relative(p) if p < 0 => write!(f, "[rb{}]", p),
            Param::Relative(p) => write!(f, "[rb+{}]", p),
        }
    }
}

impl FromPointer for Param {
    fn from_pointer(ptr: &mut Pointer, modes: &mut Modes) -> Result<Param, Error> {
        let mode = modes.next()?;
        Ok(Param::new(mode, ptr.next()))
    }
}

impl FromPointer for (Param, Param) {
    fn from_pointer(ptr: &mut Pointer, modes: &mut Modes) -> Result<(Param, Param), Error> {
        Ok((Param::from_pointer(ptr, modes)?, Param::from_pointer(ptr, modes)?))
    }
}

impl FromPointer for (Param, Param, Param) {
    fn from_pointer(ptr: &mut Pointer, modes: &mut Modes) -> Result<(Param, Param, Param), Error> {
        Ok((
            Param::from_pointer(ptr, modes)?,
            Param::from_pointer(ptr, modes)?,
            Param::from_pointer(ptr, modes)?,
        ))
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Add(Param, Param, Param),
    Mul(Param, Param, Param),
    In(Param),
    Out(Param),
    Jt(Param, Param),
    Jf(Param, Param),
    Lt(Param, Param, Param),
    Eq(Param, Param, Param),
    Arb(Param),
    Halt,
}

/// What an executed instruction wants to happen next.
enum Flow {
    Next(usize),
    Halt,
    AwaitInput,
}

impl Instruction {
    /// Decodes the instruction at `addr`. Also returns the address right
    /// after its last parameter.
    pub fn decode(mem: &Memory, addr: usize) -> Result<(Instruction, usize), Error> {
        let mut ptr = mem.pointer(addr);
        let word = ptr.next();
        if word < 0 {
            return Err(Error::InvalidOpcode { word, ip: addr });
        }
        let mut modes = Modes { digits: word / 100, ip: addr };
        let ptr = &mut ptr;
        let modes = &mut modes;
        let instruction = match word % 100 {
            1 => FromPointer::from_pointer(ptr, modes).map(|(a, b, c)| Instruction::Add(a, b, c))?,
            2 => FromPointer::from_pointer(ptr, modes).map(|(a, b, c)| Instruction::Mul(a, b, c))?,
            3 => FromPointer::from_pointer(ptr, modes).map(Instruction::In)?,
            4 => FromPointer::from_pointer(ptr, modes).map(Instruction::Out)?,
            5 => FromPointer::from_pointer(ptr, modes).map(|(a, b)| Instruction::Jt(a, b))?,
            6 => FromPointer::from_pointer(ptr, modes).map(|(a, b)| Instruction::Jf(a, b))?,
            7 => FromPointer::from_pointer(ptr, modes).map(|(a, b, c)| Instruction::Lt(a, b, c))?,
            8 => FromPointer::from_pointer(ptr, modes).map(|(a, b, c)| Instruction::Eq(a, b, c))?,
            9 => FromPointer::from_pointer(ptr, modes).map(Instruction::Arb)?,
            99 => Instruction::Halt,
            _ => return Err(Error::InvalidOpcode { word, ip: addr }),
        };
        Ok((instruction, ptr.addr()))
    }

    /// Executes against `vm`, whose pointer still addresses this
    /// instruction. `next` is the fall-through address.
    fn execute(&self, vm: &mut Vm, next: usize) -> Result<Flow, Error> {
        let ip = vm.ip;
        Ok(match *self {
            Instruction::Add(ref a, ref b, ref c) => {
                let val = a.get(vm)?.checked_add(b.get(vm)?).ok_or(Error::Overflow { ip })?;
                c.set(vm, val)?;
                Flow::Next(next)
            },
            Instruction::Mul(ref a, ref b, ref c) => {
                let val = a.get(vm)?.checked_mul(b.get(vm)?).ok_or(Error::Overflow { ip })?;
                c.set(vm, val)?;
                Flow::Next(next)
            },
            Instruction::In(ref a) => {
                // Resolve the target first so a failed write doesn't consume input
                let addr = a.address(vm)?;
                match vm.input.front().copied() {
                    Some(val) => {
                        vm.write(addr, val)?;
                        vm.input.pop_front();
                        Flow::Next(next)
                    },
                    None => Flow::AwaitInput,
                }
            },
            Instruction::Out(ref a) => {
                let val = a.get(vm)?;
                vm.output.push(val);
                Flow::Next(next)
            },
            Instruction::Jt(ref a, ref b) => {
                match a.get(vm)? != 0 {
                    true => Flow::Next(vm.address(b.get(vm)?)?),
                    false => Flow::Next(next),
                }
            },
            Instruction::Jf(ref a, ref b) => {
                match a.get(vm)? == 0 {
                    true => Flow::Next(vm.address(b.get(vm)?)?),
                    false => Flow::Next(next),
                }
            },
            Instruction::Lt(ref a, ref b, ref c) => {
                let val = (a.get(vm)? < b.get(vm)?) as i64;
                c.set(vm, val)?;
                Flow::Next(next)
            },
            Instruction::Eq(ref a, ref b, ref c) => {
                let val = (a.get(vm)? == b.get(vm)?) as i64;
                c.set(vm, val)?;
                Flow::Next(next)
            },
            Instruction::Arb(ref a) => {
                let offset = a.get(vm)?;
                vm.relative_base = vm.relative_base.checked_add(offset).ok_or(Error::Overflow { ip })?;
                Flow::Next(next)
            },
            Instruction::Halt => Flow::Halt,
        })
    }
}


/// Result of a single step or of resuming execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    /// Stopped on an input instruction with an empty queue. The pointer
    /// stays on that instruction, so pushing input and resuming retries it.
    AwaitingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Halted,
    Aborted(Error),
}

/// Final state handed back by `Vm::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub memory: Vec<i64>,
    pub output: Vec<i64>,
    pub status: Status,
}

impl RunResult {
    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }
}


#[derive(Debug, Clone)]
pub struct Vm {
    mem: Memory,
    ip: usize,
    relative_base: i64,
    input: VecDeque<i64>,
    output: Vec<i64>,
    halted: bool,
    steps: u64,
}

impl Vm {
    pub fn new<I: IntoIterator<Item = i64>>(program: &[i64], inputs: I) -> Vm {
        Vm::from_memory(Memory::from(program), inputs)
    }

    pub fn from_memory<I: IntoIterator<Item = i64>>(mem: Memory, inputs: I) -> Vm {
        Vm {
            mem,
            ip: 0,
            relative_base: 0,
            input: inputs.into_iter().collect(),
            output: Vec::new(),
            halted: false,
            steps: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn output(&self) -> &[i64] {
        &self.output
    }

    /// Drains the output log, for feeding one VM's output into another.
    pub fn take_output(&mut self) -> Vec<i64> {
        std::mem::take(&mut self.output)
    }

    pub fn push_input(&mut self, value: i64) {
        self.input.push_back(value);
    }

    pub fn extend_input<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        self.input.extend(values);
    }

    fn write(&mut self, addr: usize, value: i64) -> Result<(), Error> {
        let ip = self.ip;
        self.mem.set(addr, value).map_err(|_| Error::InvalidAddress { address: addr as i64, ip })
    }

    fn address(&self, addr: i64) -> Result<usize, Error> {
        usize::try_from(addr).map_err(|_| Error::InvalidAddress { address: addr, ip: self.ip })
    }

    pub fn step(&mut self) -> Result<State, Error> {
        if self.halted { return Ok(State::Halted) }
        let addr = self.ip;
        if addr >= self.mem.len() {
            warn!("Instruction pointer {} ran past end of memory ({} words)", addr, self.mem.len());
            return Err(Error::OutOfBounds { ip: addr });
        }
        let (instruction, next) = Instruction::decode(&self.mem, addr).map_err(|e| {
            warn!("{:6} {}", addr, e);
            e
        })?;
        debug!("{:6} {:?}", addr, instruction);
        match instruction.execute(self, next) {
            Ok(Flow::Next(ip)) => {
                self.ip = ip;
                self.steps += 1;
                Ok(State::Running)
            },
            Ok(Flow::Halt) => {
                self.halted = true;
                self.steps += 1;
                info!("Halted at {} after {} instructions", addr, self.steps);
                Ok(State::Halted)
            },
            Ok(Flow::AwaitInput) => Ok(State::AwaitingInput),
            Err(e) => {
                warn!("{:6} {}", addr, e);
                Err(e)
            },
        }
    }

    /// Runs until the program halts or blocks on input.
    pub fn resume(&mut self) -> Result<State, Error> {
        loop {
            match self.step()? {
                State::Running => continue,
                state => return Ok(state),
            }
        }
    }

    /// Runs to completion. Running out of input aborts the run.
    pub fn run(&mut self) -> RunResult {
        let status = match self.resume() {
            Ok(State::AwaitingInput) => {
                warn!("{:6} input exhausted", self.ip);
                Status::Aborted(Error::InputExhausted { ip: self.ip })
            },
            Ok(_) => Status::Halted,
            Err(e) => Status::Aborted(e),
        };
        RunResult {
            memory: self.mem.as_slice().to_vec(),
            output: self.output.clone(),
            status,
        }
    }
}
