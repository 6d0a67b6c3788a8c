use intcode::{Error, ErrorKind, Memory, State, Status, Vm};

fn run(program: &[i64], inputs: &[i64]) -> (Vec<i64>, Status) {
    let result = Vm::new(program, inputs.iter().copied()).run();
    (result.output, result.status)
}

#[test]
fn gravity_assist() {
    let mem = Memory::parse("1,9,10,3,2,3,11,0,99,30,40,50").unwrap();
    let result = Vm::from_memory(mem, vec![]).run();
    assert!(result.is_halted());
    assert_eq!(result.memory, vec![3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]);

    let result = Vm::new(&[1, 1, 1, 4, 99, 5, 6, 0, 99], vec![]).run();
    assert_eq!(result.memory, vec![30, 1, 1, 4, 2, 5, 6, 0, 99]);
}

#[test]
fn caller_program_is_not_modified() {
    let mut program = vec![1, 0, 0, 0, 99];
    let mut vm = Vm::new(&program, vec![]);
    program[4] = 1;
    let result = vm.run();
    assert!(result.is_halted());
    assert_eq!(result.memory, vec![2, 0, 0, 0, 99]);
    assert_eq!(program, vec![1, 0, 0, 0, 1]);
}

#[test]
fn echo() {
    assert_eq!(run(&[3, 0, 4, 0, 99], &[42]), (vec![42], Status::Halted));
    let (output, status) = run(&[3, 0, 4, 0, 99], &[]);
    assert!(output.is_empty());
    match status {
        Status::Aborted(e) => {
            assert_eq!(e.kind(), ErrorKind::InputExhausted);
            assert_eq!(e.ip(), 0);
        },
        Status::Halted => panic!("expected abort"),
    }
}

#[test]
fn equal_to_eight() {
    let program = [3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8];
    assert_eq!(run(&program, &[8]), (vec![1], Status::Halted));
    assert_eq!(run(&program, &[7]), (vec![0], Status::Halted));
    let program = [3, 3, 1108, -1, 8, 3, 4, 3, 99];
    assert_eq!(run(&program, &[8]), (vec![1], Status::Halted));
    assert_eq!(run(&program, &[-8]), (vec![0], Status::Halted));
}

#[test]
fn less_than_eight() {
    let program = [3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8];
    assert_eq!(run(&program, &[3]), (vec![1], Status::Halted));
    assert_eq!(run(&program, &[9]), (vec![0], Status::Halted));
}

#[test]
fn memory_grows_with_zero_fill() {
    // rb = 20, write 7 to rb+5, output mem[20] and mem[rb+5]
    let program = [109, 20, 21101, 3, 4, 5, 4, 20, 204, 5, 99];
    let result = Vm::new(&program, vec![]).run();
    assert!(result.is_halted());
    assert_eq!(result.memory.len(), 26);
    assert_eq!(result.memory[25], 7);
    assert!(result.memory[program.len()..25].iter().all(|&n| n == 0));
    assert_eq!(result.output, vec![0, 7]);
}

#[test]
fn quine() {
    let program = [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];
    let (output, status) = run(&program, &[]);
    assert_eq!(status, Status::Halted);
    assert_eq!(output, program.to_vec());
}

#[test]
fn large_numbers() {
    let (output, _) = run(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0], &[]);
    assert_eq!(output, vec![1219070632396864]);
    assert_eq!(output[0].to_string().len(), 16);
    let (output, _) = run(&[104, 1125899906842624, 99], &[]);
    assert_eq!(output, vec![1125899906842624]);
}

#[test]
fn deterministic_construction() {
    let program = [3, 0, 3, 1, 2, 0, 1, 12, 4, 12, 99, 0];
    let first = Vm::new(&program, vec![6, 7]).run();
    let second = Vm::new(&program, vec![6, 7]).run();
    assert_eq!(first, second);
    assert_eq!(first.output, vec![42]);
}

#[test]
fn falling_off_the_end_is_not_a_halt() {
    let (output, status) = run(&[104, 3], &[]);
    assert_eq!(output, vec![3]);
    assert_eq!(status, Status::Aborted(Error::OutOfBounds { ip: 2 }));
}

#[test]
fn amplifier_chain() {
    let program = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];
    let mut signal = 0;
    for phase in [4, 3, 2, 1, 0] {
        let (output, status) = run(&program, &[phase, signal]);
        assert_eq!(status, Status::Halted);
        signal = output[0];
    }
    assert_eq!(signal, 43210);
}

#[test]
fn amplifier_feedback_loop() {
    let program = [
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];
    let mut amps: Vec<Vm> = [9, 8, 7, 6, 5].iter().map(|&phase| Vm::new(&program, vec![phase])).collect();
    let mut signal = vec![0];
    while !amps[4].is_halted() {
        for amp in amps.iter_mut() {
            amp.extend_input(signal.drain(..));
            let state = amp.resume().unwrap();
            assert!(state == State::AwaitingInput || state == State::Halted);
            signal = amp.take_output();
        }
    }
    assert!(amps.iter().all(Vm::is_halted));
    assert_eq!(signal, vec![139629729]);
}
